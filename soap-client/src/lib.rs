//! Private SOAP client for UPnP control requests
//!
//! This crate provides the minimal SOAP transport used to drive Sonos
//! speakers directly: it wraps an action payload in an envelope, POSTs it to
//! the speaker's control endpoint and hands back the `<ActionResponse>`
//! element, or a typed fault when the device rejects the action.

mod error;

pub use error::SoapError;

use std::time::Duration;
use xmltree::Element;

/// Port Sonos speakers listen on for UPnP control traffic
pub const DEFAULT_PORT: u16 = 1400;

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with a 5 second overall timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Create a SOAP client whose connect and read phases are bounded by `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(timeout)
                .timeout_read(timeout)
                .timeout_write(timeout)
                .build(),
        }
    }

    /// Send a SOAP action and return the parsed `<{action}Response>` element
    ///
    /// # Arguments
    /// * `host` - Device address, either `ip` or `ip:port` (port defaults to 1400)
    /// * `endpoint` - Control path, e.g. `MediaRenderer/AVTransport/Control`
    /// * `service_uri` - UPnP service type used for the envelope namespace
    /// * `action` - SOAP action name, e.g. `Play`
    /// * `payload` - Already escaped XML arguments for the action
    pub fn call(
        &self,
        host: &str,
        endpoint: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = envelope(service_uri, action, payload);
        let url = format!("http://{}/{}", with_default_port(host), endpoint);
        let soap_action = format!("\"{}#{}\"", service_uri, action);

        let xml_text = match self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            // UPnP faults arrive as HTTP 500 with a SOAP body worth decoding
            Err(ureq::Error::Status(500, response)) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            Err(ureq::Error::Status(code, _)) => {
                return Err(SoapError::Network(format!("HTTP {} from {}", code, url)))
            }
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        let xml = Element::parse(xml_text.as_bytes())
            .map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape text for inclusion inside a SOAP argument element.
///
/// DIDL metadata is itself XML, so it is escaped once more when embedded.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn envelope(service_uri: &str, action: &str, payload: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_uri}">{payload}</u:{action}></s:Body></s:Envelope>"#,
        action = action,
        service_uri = service_uri,
        payload = payload
    )
}

fn with_default_port(host: &str) -> String {
    if host.contains(':') {
        host.to_string()
    } else {
        format!("{}:{}", host, DEFAULT_PORT)
    }
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        let error_code = fault
            .get_child("detail")
            .and_then(|d| d.get_child("UPnPError").or_else(|| d.get_child("UpnPError")))
            .and_then(|e| e.get_child("errorCode"))
            .and_then(|c| c.get_text())
            .and_then(|t| t.trim().parse::<u16>().ok())
            .unwrap_or(500);
        return Err(SoapError::Fault(error_code));
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_appended() {
        assert_eq!(with_default_port("192.168.1.20"), "192.168.1.20:1400");
        assert_eq!(with_default_port("127.0.0.1:8080"), "127.0.0.1:8080");
    }

    #[test]
    fn test_envelope_wraps_payload() {
        let body = envelope(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "Next",
            "<InstanceID>0</InstanceID>",
        );
        assert!(body.contains(
            r#"<u:Next xmlns:u="urn:schemas-upnp-org:service:AVTransport:1"><InstanceID>0</InstanceID></u:Next>"#
        ));
        assert!(body.starts_with("<?xml"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_extract_response_with_valid_response() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <u:RemoveAllTracksFromQueueResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">
                    </u:RemoveAllTracksFromQueueResponse>
                </s:Body>
            </s:Envelope>
        "#;

        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        let response = extract_response(&xml, "RemoveAllTracksFromQueue").unwrap();
        assert_eq!(response.name, "RemoveAllTracksFromQueueResponse");
    }

    #[test]
    fn test_extract_response_with_upnp_fault() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault>
                        <faultcode>s:Client</faultcode>
                        <faultstring>UPnPError</faultstring>
                        <detail>
                            <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
                                <errorCode>701</errorCode>
                            </UPnPError>
                        </detail>
                    </s:Fault>
                </s:Body>
            </s:Envelope>
        "#;

        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        match extract_response(&xml, "Play").unwrap_err() {
            SoapError::Fault(code) => assert_eq!(code, 701),
            other => panic!("Expected SoapError::Fault, got {:?}", other),
        }
    }

    #[test]
    fn test_fault_without_detail_defaults_to_500() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault><faultcode>s:Server</faultcode></s:Fault>
                </s:Body>
            </s:Envelope>
        "#;

        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        assert!(matches!(
            extract_response(&xml, "Play"),
            Err(SoapError::Fault(500))
        ));
    }

    #[test]
    fn test_extract_response_missing_action_response() {
        let xml_str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body></s:Body></s:Envelope>"#;

        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        match extract_response(&xml, "Pause").unwrap_err() {
            SoapError::Parse(msg) => assert!(msg.contains("Missing PauseResponse element")),
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }
}
