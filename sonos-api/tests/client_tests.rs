//! SonosClient against a mocked zone player

use mockito::{Matcher, Server};
use rstest::rstest;
use sonos_api::didl::parse_favorites;
use sonos_api::operations::av_transport::{
    NextOperation, NextRequest, PauseOperation, PauseRequest, PreviousOperation, PreviousRequest,
    RemoveAllTracksFromQueueOperation, RemoveAllTracksFromQueueRequest,
};
use sonos_api::operations::content_directory::{BrowseOperation, BrowseRequest, FAVORITES_OBJECT_ID};
use sonos_api::operations::rendering_control::{SetRelativeVolumeOperation, SetRelativeVolumeRequest};
use sonos_api::{ApiError, SonosClient, SonosOperation};

fn envelope(inner: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>{}</s:Body></s:Envelope>"#,
        inner
    )
}

fn expect_action<Op: SonosOperation>(server: &mut Server) -> mockito::Mock {
    let info = Op::SERVICE.info();
    server
        .mock("POST", format!("/{}", info.endpoint).as_str())
        .match_header(
            "soapaction",
            format!("\"{}#{}\"", info.service_uri, Op::ACTION).as_str(),
        )
        .with_status(200)
        .with_body(envelope(&format!(
            r#"<u:{}Response xmlns:u="{}"/>"#,
            Op::ACTION,
            info.service_uri
        )))
        .create()
}

#[rstest]
#[case::pause("Pause")]
#[case::next("Next")]
#[case::previous("Previous")]
#[case::clear("RemoveAllTracksFromQueue")]
fn test_transport_actions_hit_av_transport(#[case] action: &str) {
    let mut server = Server::new();
    let host = server.host_with_port();
    let client = SonosClient::new();

    let mock = match action {
        "Pause" => {
            let mock = expect_action::<PauseOperation>(&mut server);
            client
                .execute::<PauseOperation>(&host, &PauseRequest { instance_id: 0 })
                .unwrap();
            mock
        }
        "Next" => {
            let mock = expect_action::<NextOperation>(&mut server);
            client
                .execute::<NextOperation>(&host, &NextRequest { instance_id: 0 })
                .unwrap();
            mock
        }
        "Previous" => {
            let mock = expect_action::<PreviousOperation>(&mut server);
            client
                .execute::<PreviousOperation>(&host, &PreviousRequest { instance_id: 0 })
                .unwrap();
            mock
        }
        _ => {
            let mock = expect_action::<RemoveAllTracksFromQueueOperation>(&mut server);
            client
                .execute::<RemoveAllTracksFromQueueOperation>(
                    &host,
                    &RemoveAllTracksFromQueueRequest { instance_id: 0 },
                )
                .unwrap();
            mock
        }
    };

    mock.assert();
}

#[test]
fn test_relative_volume_returns_new_level() {
    let mut server = Server::new();
    server
        .mock("POST", "/MediaRenderer/RenderingControl/Control")
        .match_body(Matcher::Regex("<Adjustment>5</Adjustment>".to_string()))
        .with_status(200)
        .with_body(envelope(
            r#"<u:SetRelativeVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><NewVolume>30</NewVolume></u:SetRelativeVolumeResponse>"#,
        ))
        .create();

    let response = SonosClient::new()
        .execute::<SetRelativeVolumeOperation>(
            &server.host_with_port(),
            &SetRelativeVolumeRequest {
                instance_id: 0,
                channel: "Master".to_string(),
                adjustment: 5,
            },
        )
        .unwrap();

    assert_eq!(response.new_volume, 30);
}

#[test]
fn test_browse_favorites_end_to_end() {
    let mut server = Server::new();
    server
        .mock("POST", "/MediaServer/ContentDirectory/Control")
        .match_body(Matcher::Regex("<ObjectID>FV:2</ObjectID>".to_string()))
        .with_status(200)
        .with_body(envelope(
            r#"<u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><Result>&lt;DIDL-Lite xmlns:dc=&quot;http://purl.org/dc/elements/1.1/&quot;&gt;&lt;item id=&quot;FV:2/3&quot; parentID=&quot;FV:2&quot;&gt;&lt;dc:title&gt;Jazz&lt;/dc:title&gt;&lt;res&gt;x-sonosapi-stream:s1&lt;/res&gt;&lt;/item&gt;&lt;/DIDL-Lite&gt;</Result><NumberReturned>1</NumberReturned><TotalMatches>1</TotalMatches><UpdateID>4</UpdateID></u:BrowseResponse>"#,
        ))
        .create();

    let response = SonosClient::new()
        .execute::<BrowseOperation>(
            &server.host_with_port(),
            &BrowseRequest::children(FAVORITES_OBJECT_ID),
        )
        .unwrap();
    let favorites = parse_favorites(&response.result).unwrap();

    assert_eq!(response.number_returned, 1);
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].title, "Jazz");
    assert_eq!(favorites[0].uri.as_deref(), Some("x-sonosapi-stream:s1"));
}

#[test]
fn test_unreachable_speaker_is_a_network_error() {
    // Nothing listens on port 9 on localhost in the test environment
    let err = SonosClient::with_timeout(std::time::Duration::from_millis(500))
        .execute::<PauseOperation>("127.0.0.1:9", &PauseRequest { instance_id: 0 })
        .unwrap_err();

    assert!(matches!(err, ApiError::NetworkError(_)));
}
