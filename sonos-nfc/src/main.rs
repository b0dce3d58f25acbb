use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use sonos_nfc::config::{Backend, Config};
use sonos_nfc::error::RegistryError;
use sonos_nfc::logging::init_logging;
use sonos_nfc::target::direct::DirectFleet;
use sonos_nfc::target::gateway::{GatewayClient, GatewayFleet};
use sonos_nfc::telemetry::{default_id_dir, installation_id};
use sonos_nfc::{
    Dispatcher, Executor, HttpTelemetry, LineTagSource, NoTelemetry, Registry, Session,
    TelemetrySink,
};

const READER_TROUBLESHOOTING: &str = "Please check:
  1. The reader bridge is running and writing to the configured device or FIFO
  2. No other process holds the reader (e.g. a previous sonos-nfc under a service manager)
  3. The path given with --reader / SONOS_NFC_READER exists and is readable";

fn build_registry(config: &Config) -> Result<Registry> {
    match config.backend {
        Backend::Gateway => {
            let client = Arc::new(
                GatewayClient::new(config.gateway_url.clone(), config.timeout)
                    .context("Failed to create gateway client")?,
            );

            if config.check {
                match client.check() {
                    Ok(()) => info!(url = %client.base(), "API connection successful"),
                    Err(e) => warn!(
                        url = %client.base(),
                        error = %e,
                        "API not responding, continuing with reduced functionality"
                    ),
                }
            }

            Ok(Registry::new(GatewayFleet::new(client)))
        }
        Backend::Direct => {
            let fleet = DirectFleet::new(config.speakers.clone(), config.timeout)
                .context("Failed to create speaker clients")?;
            info!(speakers = config.speakers.len(), "Using direct speaker control");
            Ok(Registry::new(fleet))
        }
    }
}

fn build_telemetry(config: &Config) -> Result<Arc<dyn TelemetrySink>> {
    let Some(url) = &config.telemetry_url else {
        return Ok(Arc::new(NoTelemetry));
    };

    let device_id = default_id_dir()
        .map(|dir| installation_id(&dir))
        .unwrap_or_else(uuid::Uuid::new_v4);
    let sink = HttpTelemetry::new(url.clone(), device_id, config.timeout)
        .context("Failed to create telemetry client")?;
    info!(url = %url, "Anonymous usage statistics enabled");
    Ok(Arc::new(sink))
}

fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to parse configuration")?;

    init_logging(config.log_format, &config.log_level).context("Failed to initialize logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), backend = ?config.backend, "Starting sonos-nfc");

    let registry = build_registry(&config)?;
    let telemetry = build_telemetry(&config)?;

    let source = match LineTagSource::open(&config.reader) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "Failed to initialize NFC reader");
            error!("{}", READER_TROUBLESHOOTING);
            return Err(e).context("NFC reader unavailable");
        }
    };
    info!(reader = source.name(), "Connected to NFC reader");

    let session = match registry.resolve(&config.room) {
        Ok(resolution) => {
            let session = Session::new(config.room.clone())
                .with_room(resolution.target.player_name().to_string(), resolution.target);
            info!(room = session.room_name(), "Room set");
            session
        }
        Err(RegistryError::Enumeration(e)) => {
            warn!(
                room = %config.room,
                error = %e,
                "Speakers unreachable, the room will be resolved when a tag is read"
            );
            Session::new(config.room.clone())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to select a speaker for room '{}'", config.room));
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Shutting down gracefully...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install signal handler")?;

    let executor = Executor::new(registry, telemetry.clone()).with_volume_step(config.volume_step);
    let mut dispatcher = Dispatcher::new(source, executor, session, telemetry)
        .with_poll_interval(config.poll_interval);
    dispatcher.run(&shutdown);

    info!("sonos-nfc stopped");
    Ok(())
}
