//! AVTransport service operations
//!
//! Transport control and queue manipulation for a single zone player.

use soap_client::escape_xml;
use xmltree::Element;

use crate::operation::child_number;
use crate::{ApiError, Service, SonosOperation};

define_operation! {
    /// Start or resume playback of the current transport URI
    operation: Play,
    action: "Play",
    service: AVTransport,
    request: {
        speed: String,
    },
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><Speed>{}</Speed>",
        req.instance_id, escape_xml(&req.speed)
    ),
}

define_operation! {
    /// Pause playback
    operation: Pause,
    action: "Pause",
    service: AVTransport,
    request: {},
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
}

define_operation! {
    /// Skip to the next track in the queue
    operation: Next,
    action: "Next",
    service: AVTransport,
    request: {},
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
}

define_operation! {
    /// Go back to the previous track in the queue
    operation: Previous,
    action: "Previous",
    service: AVTransport,
    request: {},
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
}

define_operation! {
    /// Empty the zone's queue
    operation: RemoveAllTracksFromQueue,
    action: "RemoveAllTracksFromQueue",
    service: AVTransport,
    request: {},
    payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
}

define_operation! {
    /// Point the transport at a URI (a stream, or the zone's own queue)
    operation: SetAvTransportUri,
    action: "SetAVTransportURI",
    service: AVTransport,
    request: {
        current_uri: String,
        current_uri_meta_data: String,
    },
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><CurrentURI>{}</CurrentURI><CurrentURIMetaData>{}</CurrentURIMetaData>",
        req.instance_id,
        escape_xml(&req.current_uri),
        escape_xml(&req.current_uri_meta_data)
    ),
}

define_operation! {
    /// Seek within the transport; `unit` is `TRACK_NR` or `REL_TIME`
    operation: Seek,
    action: "Seek",
    service: AVTransport,
    request: {
        unit: String,
        target: String,
    },
    payload: |req| format!(
        "<InstanceID>{}</InstanceID><Unit>{}</Unit><Target>{}</Target>",
        req.instance_id,
        escape_xml(&req.unit),
        escape_xml(&req.target)
    ),
}

/// Append a URI (track or container) to the zone's queue
pub struct AddUriToQueueOperation;

/// Request for the `AddURIToQueue` action
#[derive(Debug, Clone, PartialEq)]
pub struct AddUriToQueueRequest {
    pub instance_id: u32,
    pub enqueued_uri: String,
    pub enqueued_uri_meta_data: String,
    /// 0 appends to the end of the queue
    pub desired_first_track_number_enqueued: u32,
    pub enqueue_as_next: bool,
}

/// Response for the `AddURIToQueue` action
#[derive(Debug, Clone, PartialEq)]
pub struct AddUriToQueueResponse {
    pub first_track_number_enqueued: u32,
    pub num_tracks_added: u32,
    pub new_queue_length: u32,
}

impl SonosOperation for AddUriToQueueOperation {
    type Request = AddUriToQueueRequest;
    type Response = AddUriToQueueResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "AddURIToQueue";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><EnqueuedURI>{}</EnqueuedURI><EnqueuedURIMetaData>{}</EnqueuedURIMetaData><DesiredFirstTrackNumberEnqueued>{}</DesiredFirstTrackNumberEnqueued><EnqueueAsNext>{}</EnqueueAsNext>",
            request.instance_id,
            escape_xml(&request.enqueued_uri),
            escape_xml(&request.enqueued_uri_meta_data),
            request.desired_first_track_number_enqueued,
            if request.enqueue_as_next { 1 } else { 0 }
        )
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(AddUriToQueueResponse {
            first_track_number_enqueued: child_number(xml, "FirstTrackNumberEnqueued")?,
            num_tracks_added: child_number(xml, "NumTracksAdded")?,
            new_queue_length: child_number(xml, "NewQueueLength")?,
        })
    }
}
