use xmltree::Element;

use crate::error::ApiError;
use crate::service::Service;

/// Base trait for all Sonos control operations
///
/// Ties a SOAP action name to its service, the typed request that builds the
/// argument payload, and the typed response parsed from `<{ACTION}Response>`.
pub trait SonosOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// The UPnP service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Build the XML argument payload (without SOAP envelope)
    ///
    /// String arguments must already be escaped with [`soap_client::escape_xml`].
    fn build_payload(request: &Self::Request) -> String;

    /// Parse the `<{ACTION}Response>` element into the typed response
    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError>;
}

/// Read a required child element's text from an action response
pub(crate) fn child_text(xml: &Element, name: &str) -> Result<String, ApiError> {
    xml.get_child(name)
        .and_then(|e| e.get_text())
        .map(|t| t.into_owned())
        .ok_or_else(|| ApiError::ParseError(format!("Missing {} element", name)))
}

/// Read a required numeric child element from an action response
pub(crate) fn child_number<T: std::str::FromStr>(xml: &Element, name: &str) -> Result<T, ApiError> {
    let text = child_text(xml, name)?;
    text.trim()
        .parse::<T>()
        .map_err(|_| ApiError::ParseError(format!("Invalid {} value: {}", name, text)))
}
