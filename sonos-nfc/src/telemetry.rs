//! Anonymous usage statistics
//!
//! When enabled, a handful of events (unrecognised tag text, unreadable tags)
//! are posted to a statistics endpoint. Reports are fire-and-forget: failures
//! are logged at debug level and otherwise ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Version string sent with every report
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const ID_FILE: &str = "installation-id";

/// Destination for usage events
pub trait TelemetrySink: Send + Sync {
    fn report(&self, message: &str);
}

/// Telemetry switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTelemetry;

impl TelemetrySink for NoTelemetry {
    fn report(&self, message: &str) {
        debug!(message, "Telemetry disabled, not reporting");
    }
}

/// Form-encoded POST of `time`, `appVersion`, `deviceId`, `message`
#[derive(Debug, Clone)]
pub struct HttpTelemetry {
    client: reqwest::blocking::Client,
    url: String,
    device_id: String,
}

impl HttpTelemetry {
    pub fn new(url: impl Into<String>, device_id: Uuid, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            device_id: device_id.to_string(),
        })
    }

    fn deliver(&self, message: &str) {
        let time = format!("{:.3}", Utc::now().timestamp_millis() as f64 / 1000.0);
        let form = [
            ("time", time.as_str()),
            ("appVersion", APP_VERSION),
            ("deviceId", self.device_id.as_str()),
            ("message", message),
        ];

        match self.client.post(&self.url).form(&form).send() {
            Ok(response) => debug!(status = %response.status(), message, "Telemetry sent"),
            Err(e) => debug!(error = %e, message, "Telemetry not sent"),
        }
    }
}

impl TelemetrySink for HttpTelemetry {
    /// Posts from a short-lived thread and returns immediately
    fn report(&self, message: &str) {
        let sink = self.clone();
        let message = message.to_string();
        let spawned = thread::Builder::new()
            .name("telemetry".to_string())
            .spawn(move || sink.deliver(&message));
        if let Err(e) = spawned {
            debug!(error = %e, "Telemetry thread not started");
        }
    }
}

/// Default directory for the installation id
pub fn default_id_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("sonos-nfc"))
}

/// The random identifier of this installation
///
/// Read from `<dir>/installation-id`; a fresh v4 UUID is generated and stored
/// when the file is missing or unreadable. A failed write only costs
/// stability of the id across restarts.
pub fn installation_id(dir: &Path) -> Uuid {
    let path = dir.join(ID_FILE);
    if let Some(id) = fs::read_to_string(&path)
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
    {
        return id;
    }

    let id = Uuid::new_v4();
    let stored = fs::create_dir_all(dir).and_then(|_| fs::write(&path, id.to_string()));
    if let Err(e) = stored {
        warn!(path = %path.display(), error = %e, "Could not store installation id");
    }
    id
}
