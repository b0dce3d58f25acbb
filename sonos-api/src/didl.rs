//! DIDL-Lite handling for favourites and share-link metadata
//!
//! Favourites come back from `Browse("FV:2")` as a DIDL-Lite document with one
//! `<item>` per favourite:
//!
//! ```xml
//! <DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" ...>
//!   <item id="FV:2/15" parentID="FV:2" restricted="false">
//!     <dc:title>Jazz24</dc:title>
//!     <res protocolInfo="x-sonosapi-stream:*:*:*">x-sonosapi-stream:s34682?sid=254</res>
//!     <r:resMD>&lt;DIDL-Lite ...&gt;</r:resMD>
//!   </item>
//! </DIDL-Lite>
//! ```

use soap_client::escape_xml;
use xmltree::{Element, XMLNode};

use crate::{ApiError, Result};

const DIDL_OPEN: &str = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#;

/// A playable favourite stored on the household
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteItem {
    /// Object id, e.g. `FV:2/15`
    pub id: String,
    pub title: String,
    /// Transport URI from `<res>`, absent for shortcut-only favourites
    pub uri: Option<String>,
    /// DIDL metadata from `<r:resMD>` to pass along with the URI
    pub metadata: Option<String>,
}

impl FavoriteItem {
    /// Containers (albums, playlists) must be queued instead of streamed
    pub fn is_container(&self) -> bool {
        self.uri
            .as_deref()
            .map(|uri| uri.starts_with("x-rincon-cpcontainer:"))
            .unwrap_or(false)
            || self
                .metadata
                .as_deref()
                .map(|md| md.contains("object.container"))
                .unwrap_or(false)
    }
}

/// Parse the DIDL-Lite `Result` of a favourites browse
pub fn parse_favorites(didl: &str) -> Result<Vec<FavoriteItem>> {
    let root = Element::parse(didl.as_bytes())
        .map_err(|e| ApiError::ParseError(format!("Invalid DIDL-Lite: {}", e)))?;

    let favorites = root
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|e| e.name == "item" || e.name == "container")
        .filter_map(|item| {
            let title = item.get_child("title")?.get_text()?.into_owned();
            Some(FavoriteItem {
                id: item.attributes.get("id").cloned().unwrap_or_default(),
                title,
                uri: item
                    .get_child("res")
                    .and_then(|e| e.get_text())
                    .map(|t| t.into_owned()),
                metadata: item
                    .get_child("resMD")
                    .and_then(|e| e.get_text())
                    .map(|t| t.into_owned()),
            })
        })
        .collect();

    Ok(favorites)
}

/// Render single-item metadata for a music-service object
///
/// `service_token` is the `SA_RINCON...` descriptor Sonos uses to route the
/// item to the right account.
pub fn item_metadata(item_id: &str, title: &str, class: &str, service_token: &str) -> String {
    format!(
        r#"{open}<item id="{id}" parentID="-1" restricted="true"><dc:title>{title}</dc:title><upnp:class>{class}</upnp:class><desc id="cdudn" nameSpace="urn:schemas-rinconnetworks-com:metadata-1-0/">{token}</desc></item></DIDL-Lite>"#,
        open = DIDL_OPEN,
        id = escape_xml(item_id),
        title = escape_xml(title),
        class = class,
        token = service_token
    )
}
