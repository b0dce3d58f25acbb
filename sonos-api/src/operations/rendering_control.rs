//! RenderingControl service operations

use xmltree::Element;

use crate::operation::child_number;
use crate::{ApiError, Service, SonosOperation};

/// Nudge the volume up or down relative to its current value
pub struct SetRelativeVolumeOperation;

/// Request for SetRelativeVolume operation
#[derive(Debug, Clone, PartialEq)]
pub struct SetRelativeVolumeRequest {
    pub instance_id: u32,
    pub channel: String,
    pub adjustment: i8,
}

/// Response for SetRelativeVolume operation
#[derive(Debug, Clone, PartialEq)]
pub struct SetRelativeVolumeResponse {
    pub new_volume: u8,
}

impl SonosOperation for SetRelativeVolumeOperation {
    type Request = SetRelativeVolumeRequest;
    type Response = SetRelativeVolumeResponse;

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "SetRelativeVolume";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><Channel>{}</Channel><Adjustment>{}</Adjustment>",
            request.instance_id, request.channel, request.adjustment
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(SetRelativeVolumeResponse {
            new_volume: child_number(xml, "NewVolume")?,
        })
    }
}
