//! Error taxonomy for tag handling
//!
//! Everything that can go wrong while handling one tag is contained in that
//! tag's dispatch cycle. Only [`ReaderInitError`] and an empty fleet
//! ([`RegistryError::TargetNotFound`]) during startup are fatal.

use std::path::PathBuf;

use thiserror::Error;

/// A tag was presented but its content could not be read as text
#[derive(Debug, Error)]
pub enum TagReadError {
    /// The NDEF message ended before a record was complete
    #[error("Truncated NDEF message: {0}")]
    Truncated(String),

    /// Chunked records are not used for text tags
    #[error("Chunked NDEF records are not supported")]
    Chunked,

    /// The record is not an NFC Forum text record
    #[error("Record is not a text record (TNF {tnf:#x}, type {record_type:?})")]
    NotText { tnf: u8, record_type: String },

    /// The text record's bytes are not valid UTF-8/UTF-16
    #[error("Invalid text encoding: {0}")]
    Encoding(String),

    /// The reader handed over something that is not a raw NDEF dump
    #[error("Malformed reader line: {0}")]
    Malformed(String),

    /// Reading from the reader failed
    #[error("Reader I/O error: {0}")]
    Io(String),

    /// The reader went away (end of stream)
    #[error("Tag source closed")]
    Closed,
}

/// The reader could not be opened; fatal at startup
#[derive(Debug, Error)]
pub enum ReaderInitError {
    #[error("Failed to open NFC reader at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start reader thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// Failure talking to a speaker or the HTTP gateway
#[derive(Debug, Error)]
pub enum TargetError {
    /// Connection refused, DNS failure, timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-200 status
    #[error("Gateway returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The platform answered but the action failed or the reply was unreadable
    #[error("Device error: {0}")]
    Device(String),

    /// The backend cannot express this request
    #[error("Unsupported request: {0}")]
    Unsupported(String),
}

impl TargetError {
    /// True for failures where the platform never answered
    pub fn is_transport(&self) -> bool {
        matches!(self, TargetError::Transport(_))
    }
}

impl From<sonos_api::ApiError> for TargetError {
    fn from(error: sonos_api::ApiError) -> Self {
        match error {
            sonos_api::ApiError::NetworkError(msg) => TargetError::Transport(msg),
            sonos_api::ApiError::InvalidParameter(msg) => TargetError::Unsupported(msg),
            other => TargetError::Device(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for TargetError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => TargetError::Status {
                status: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None if error.is_decode() => TargetError::Device(error.to_string()),
            None => TargetError::Transport(error.to_string()),
        }
    }
}

/// Room resolution failed
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Fleet enumeration came back empty
    #[error("No speakers available")]
    TargetNotFound,

    /// The fleet could not be enumerated at all
    #[error("Failed to enumerate speakers: {0}")]
    Enumeration(#[from] TargetError),
}

/// Executing a directive failed
#[derive(Debug, Error)]
pub enum ExecError {
    /// No target is selected for the current room
    #[error("No speaker selected for room '{0}'")]
    NoTarget(String),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ExecError {
    /// True for failures where the platform never answered
    pub fn is_transport(&self) -> bool {
        match self {
            ExecError::Target(e) => e.is_transport(),
            ExecError::Registry(RegistryError::Enumeration(e)) => e.is_transport(),
            _ => false,
        }
    }
}

/// Invalid command-line or environment configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid gateway URL '{url}': {reason}")]
    GatewayUrl { url: String, reason: String },

    #[error("Invalid speaker '{0}', expected ROOM=HOST[:PORT]")]
    Speaker(String),

    #[error("Invalid value for {field}: {reason}")]
    Value { field: &'static str, reason: String },
}
