//! Device description parsing.
//!
//! Direct control needs the zone player's UDN (`RINCON_...`) to address its
//! queue. It is read from `http://<host>:1400/xml/device_description.xml`.

use serde::Deserialize;

use crate::{ApiError, Result};

/// Path of the UPnP device description on a zone player
pub const DESCRIPTION_PATH: &str = "xml/device_description.xml";

#[derive(Debug, Deserialize)]
struct Root {
    device: DeviceDescription,
}

/// The parts of a UPnP device description used for playback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub friendly_name: String,
    pub model_name: String,
    #[serde(rename = "UDN")]
    pub udn: String,
    pub room_name: Option<String>,
}

impl DeviceDescription {
    /// Parse device description from XML.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ParseError` if the XML is malformed or missing required fields.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| ApiError::ParseError(format!("Failed to parse device XML: {}", e)))?;

        Ok(root.device)
    }

    /// The zone player id without the `uuid:` scheme, e.g. `RINCON_000E58A0123401400`
    pub fn rincon_id(&self) -> &str {
        self.udn.strip_prefix("uuid:").unwrap_or(&self.udn)
    }
}
