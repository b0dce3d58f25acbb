//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur while sending a control action
#[derive(Debug, Error)]
pub enum SoapError {
    /// Connection, timeout or unexpected HTTP status
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// Response body was not the XML we expected
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// The device answered with a UPnP fault
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}

impl SoapError {
    /// True when the failure happened before the device produced an answer
    pub fn is_transport(&self) -> bool {
        matches!(self, SoapError::Network(_))
    }
}
