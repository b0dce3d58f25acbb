//! Test doubles shared by the unit tests

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use crate::directive::Media;
use crate::error::TargetError;
use crate::target::{Favorite, Fleet, Target, TargetHandle};
use crate::telemetry::TelemetrySink;

/// One call made against a [`RecordingTarget`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Carries the gateway path of the media
    Play(String),
    OpenUrl(String),
    Resume,
    Pause,
    Next,
    Previous,
    AdjustVolume(i8),
    ClearQueue,
    ListFavorites,
    PlayFavorite(String),
}

/// A target that records every call in order
#[derive(Debug, Default)]
pub struct RecordingTarget {
    name: String,
    favorites: Vec<Favorite>,
    fail_clear: bool,
    unreachable: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTarget {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_favorites(mut self, titles: &[&str]) -> Self {
        self.favorites = titles.iter().map(|t| Favorite::titled(*t)).collect();
        self
    }

    /// Queue clearing fails with a device error
    pub fn failing_clear(mut self) -> Self {
        self.fail_clear = true;
        self
    }

    /// Every call fails with a transport error
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) -> Result<(), TargetError> {
        let is_clear = call == Call::ClearQueue;
        self.calls.lock().unwrap().push(call);
        if self.unreachable {
            return Err(TargetError::Transport("connection refused".to_string()));
        }
        if is_clear && self.fail_clear {
            return Err(TargetError::Device("queue is locked".to_string()));
        }
        Ok(())
    }
}

impl Target for RecordingTarget {
    fn player_name(&self) -> &str {
        &self.name
    }

    fn play(&self, media: &Media) -> Result<(), TargetError> {
        self.record(Call::Play(media.gateway_path()))
    }

    fn open_url(&self, url: &str) -> Result<(), TargetError> {
        self.record(Call::OpenUrl(url.to_string()))
    }

    fn resume(&self) -> Result<(), TargetError> {
        self.record(Call::Resume)
    }

    fn pause(&self) -> Result<(), TargetError> {
        self.record(Call::Pause)
    }

    fn next(&self) -> Result<(), TargetError> {
        self.record(Call::Next)
    }

    fn previous(&self) -> Result<(), TargetError> {
        self.record(Call::Previous)
    }

    fn adjust_volume(&self, delta: i8) -> Result<(), TargetError> {
        self.record(Call::AdjustVolume(delta))
    }

    fn clear_queue(&self) -> Result<(), TargetError> {
        self.record(Call::ClearQueue)
    }

    fn list_favorites(&self) -> Result<Vec<Favorite>, TargetError> {
        self.record(Call::ListFavorites)?;
        Ok(self.favorites.clone())
    }

    fn play_favorite(&self, favorite: &Favorite) -> Result<(), TargetError> {
        self.record(Call::PlayFavorite(favorite.title.clone()))
    }
}

/// A fleet with a fixed set of targets
pub struct StaticFleet {
    targets: Vec<TargetHandle>,
    failures_left: AtomicUsize,
    enumerations: AtomicUsize,
}

impl StaticFleet {
    pub fn new(targets: Vec<Arc<RecordingTarget>>) -> Self {
        Self {
            targets: targets
                .into_iter()
                .map(|t| t as TargetHandle)
                .collect(),
            failures_left: AtomicUsize::new(0),
            enumerations: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Enumeration fails with a transport error
    pub fn unreachable() -> Self {
        Self::empty().failing(usize::MAX)
    }

    /// The first `failures` enumerations fail with a transport error
    pub fn failing(self, failures: usize) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl Fleet for StaticFleet {
    fn enumerate(&self) -> Result<Vec<TargetHandle>, TargetError> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TargetError::Transport("no route to host".to_string()));
        }
        Ok(self.targets.clone())
    }
}

impl Fleet for Arc<StaticFleet> {
    fn enumerate(&self) -> Result<Vec<TargetHandle>, TargetError> {
        self.as_ref().enumerate()
    }
}

/// A sink that keeps every message
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    messages: Mutex<Vec<String>>,
}

impl RecordingTelemetry {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Collects formatted log output for assertions
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Run `f` with a subscriber writing `WARN` and above into the capture
    pub fn warnings<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn output(&self) -> String {
        self.buffer
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
