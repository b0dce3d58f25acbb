//! ContentDirectory service operations
//!
//! Only `Browse` is needed: the favourites list lives under object `FV:2`.

use soap_client::escape_xml;
use xmltree::Element;

use crate::operation::{child_number, child_text};
use crate::{ApiError, Service, SonosOperation};

/// Object id of the household's Sonos favourites
pub const FAVORITES_OBJECT_ID: &str = "FV:2";

/// Browse a ContentDirectory object
pub struct BrowseOperation;

/// Request for the `Browse` action
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseRequest {
    pub object_id: String,
    /// `BrowseDirectChildren` or `BrowseMetadata`
    pub browse_flag: String,
    pub filter: String,
    pub starting_index: u32,
    /// 0 asks for everything
    pub requested_count: u32,
    pub sort_criteria: String,
}

impl BrowseRequest {
    /// Request every direct child of `object_id`
    pub fn children(object_id: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            browse_flag: "BrowseDirectChildren".to_string(),
            filter: "*".to_string(),
            starting_index: 0,
            requested_count: 0,
            sort_criteria: String::new(),
        }
    }
}

/// Response for the `Browse` action
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResponse {
    /// DIDL-Lite document describing the returned objects
    pub result: String,
    pub number_returned: u32,
    pub total_matches: u32,
}

impl SonosOperation for BrowseOperation {
    type Request = BrowseRequest;
    type Response = BrowseResponse;

    const SERVICE: Service = Service::ContentDirectory;
    const ACTION: &'static str = "Browse";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<ObjectID>{}</ObjectID><BrowseFlag>{}</BrowseFlag><Filter>{}</Filter><StartingIndex>{}</StartingIndex><RequestedCount>{}</RequestedCount><SortCriteria>{}</SortCriteria>",
            escape_xml(&request.object_id),
            escape_xml(&request.browse_flag),
            escape_xml(&request.filter),
            request.starting_index,
            request.requested_count,
            escape_xml(&request.sort_criteria)
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(BrowseResponse {
            result: child_text(xml, "Result")?,
            number_returned: child_number(xml, "NumberReturned")?,
            total_matches: child_number(xml, "TotalMatches")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_children_payload() {
        let payload = BrowseOperation::build_payload(&BrowseRequest::children(FAVORITES_OBJECT_ID));
        assert!(payload.starts_with("<ObjectID>FV:2</ObjectID><BrowseFlag>BrowseDirectChildren</BrowseFlag>"));
        assert!(payload.ends_with("<SortCriteria></SortCriteria>"));
    }

    #[test]
    fn test_browse_response_unescapes_result() {
        let xml_str = r#"<BrowseResponse><Result>&lt;DIDL-Lite&gt;&lt;/DIDL-Lite&gt;</Result><NumberReturned>0</NumberReturned><TotalMatches>0</TotalMatches><UpdateID>1</UpdateID></BrowseResponse>"#;
        let xml = Element::parse(xml_str.as_bytes()).unwrap();

        let response = BrowseOperation::parse_response(&xml).unwrap();
        assert_eq!(response.result, "<DIDL-Lite></DIDL-Lite>");
        assert_eq!(response.total_matches, 0);
    }
}
