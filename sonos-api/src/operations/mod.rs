//! Sonos API operations organized by service
//!
//! Each submodule holds the control actions of one UPnP service. Actions
//! without interesting response data are declared with [`define_operation!`].

/// Declare an action whose response carries nothing worth parsing
///
/// Generates `{Name}Operation`, `{Name}Request` (with an `instance_id`
/// field plus the listed fields) and the [`SonosOperation`] impl.
///
/// ```rust,ignore
/// define_operation! {
///     /// Skip to the next track
///     operation: Next,
///     action: "Next",
///     service: AVTransport,
///     request: {},
///     payload: |req| format!("<InstanceID>{}</InstanceID>", req.instance_id),
/// }
/// ```
///
/// [`SonosOperation`]: crate::SonosOperation
macro_rules! define_operation {
    (
        $(#[$meta:meta])*
        operation: $name:ident,
        action: $action:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty),* $(,)?
        },
        payload: |$req:ident| $payload_expr:expr $(,)?
    ) => {
        paste::paste! {
            $(#[$meta])*
            pub struct [<$name Operation>];

            #[doc = concat!("Request for the `", $action, "` action")]
            #[derive(Debug, Clone, PartialEq)]
            pub struct [<$name Request>] {
                pub instance_id: u32,
                $(pub $field: $field_type,)*
            }

            impl $crate::SonosOperation for [<$name Operation>] {
                type Request = [<$name Request>];
                type Response = ();

                const SERVICE: $crate::Service = $crate::Service::$service;
                const ACTION: &'static str = $action;

                fn build_payload(request: &Self::Request) -> String {
                    let $req = request;
                    $payload_expr
                }

                fn parse_response(_xml: &xmltree::Element) -> Result<(), $crate::ApiError> {
                    Ok(())
                }
            }
        }
    };
}

pub mod av_transport;
pub mod content_directory;
pub mod rendering_control;

pub use av_transport::{
    AddUriToQueueOperation, NextOperation, PauseOperation, PlayOperation, PreviousOperation,
    RemoveAllTracksFromQueueOperation, SeekOperation, SetAvTransportUriOperation,
};
pub use content_directory::BrowseOperation;
pub use rendering_control::SetRelativeVolumeOperation;
