use std::time::Duration;

use soap_client::SoapClient;

use crate::{Result, SonosOperation};

/// A client for executing Sonos operations against actual devices
///
/// Bridges the stateless operation definitions and the SOAP transport. The
/// client is cheap to clone; clones share the underlying HTTP agent.
#[derive(Debug, Clone)]
pub struct SonosClient {
    soap_client: SoapClient,
}

impl SonosClient {
    /// Create a new Sonos client with the default SOAP timeouts
    pub fn new() -> Self {
        Self {
            soap_client: SoapClient::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            soap_client: SoapClient::with_timeout(timeout),
        }
    }

    /// Create a Sonos client with a custom SOAP client
    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self { soap_client }
    }

    /// Execute a Sonos operation against a device
    ///
    /// # Arguments
    /// * `host` - Speaker address, `ip` or `ip:port`
    /// * `request` - The operation request data
    ///
    /// # Example
    /// ```rust,no_run
    /// use sonos_api::SonosClient;
    /// use sonos_api::operations::av_transport::{PauseOperation, PauseRequest};
    ///
    /// let client = SonosClient::new();
    /// client.execute::<PauseOperation>("192.168.1.100", &PauseRequest { instance_id: 0 })?;
    /// # Ok::<(), sonos_api::ApiError>(())
    /// ```
    pub fn execute<Op: SonosOperation>(
        &self,
        host: &str,
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let service_info = Op::SERVICE.info();
        let payload = Op::build_payload(request);

        let xml = self.soap_client.call(
            host,
            service_info.endpoint,
            service_info.service_uri,
            Op::ACTION,
            &payload,
        )?;

        Op::parse_response(&xml)
    }
}

impl Default for SonosClient {
    fn default() -> Self {
        Self::new()
    }
}
