//! HTTP gateway backend
//!
//! Drives speakers through a node-sonos-http-api style gateway. Every action
//! is a `GET <base>/<room>/<action...>` answered with `{"status": "..."}` and
//! HTTP 200 on success; rooms come from `GET <base>/zones`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::directive::Media;
use crate::error::TargetError;
use crate::target::{Favorite, Fleet, Target, TargetHandle};

#[derive(Debug, Deserialize)]
struct StatusReply {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Zone {
    coordinator: ZoneMember,
    #[serde(default)]
    members: Vec<ZoneMember>,
}

#[derive(Debug, Deserialize)]
struct ZoneMember {
    #[serde(rename = "roomName")]
    room_name: String,
}

/// Shared HTTP plumbing for every gateway target
#[derive(Debug)]
pub struct GatewayClient {
    http: reqwest::blocking::Client,
    base: Url,
}

impl GatewayClient {
    /// `base` must be an `http` or `https` URL; requests time out after `timeout`
    pub fn new(base: Url, timeout: Duration) -> Result<Self, TargetError> {
        if base.cannot_be_a_base() {
            return Err(TargetError::Unsupported(format!("'{}' cannot be a base URL", base)));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Reachability probe: `GET <base>` must answer 2xx
    pub fn check(&self) -> Result<(), TargetError> {
        self.http.get(self.base.clone()).send()?.error_for_status()?;
        Ok(())
    }

    /// `<base>/<room>/<path>`
    ///
    /// Only the room is percent-encoded. `path` is appended as written, so an
    /// existing `%xx` escape is sent once and a `?` starts the query.
    pub fn room_url(&self, room: &str, path: &str) -> Result<Url, TargetError> {
        let mut room_url = self.url([room])?;
        room_url.set_query(None);
        room_url.set_fragment(None);
        let joined = format!("{}/{}", room_url, path.trim_start_matches('/'));
        Url::parse(&joined)
            .map_err(|e| TargetError::Unsupported(format!("Invalid gateway path '{}': {}", path, e)))
    }

    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, TargetError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TargetError::Unsupported(format!("'{}' cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> Result<reqwest::blocking::Response, TargetError> {
        debug!(url = %url, "Gateway request");
        Ok(self.http.get(url).send()?.error_for_status()?)
    }

    /// Send an action and log the gateway's status reply
    fn action(&self, room: &str, path: &str) -> Result<(), TargetError> {
        let url = self.room_url(room, path)?;
        self.fetch(url)
    }

    fn fetch(&self, url: Url) -> Result<(), TargetError> {
        let response = self.get(url)?;
        match response.json::<StatusReply>() {
            Ok(StatusReply { status: Some(status) }) => info!(status = %status, "Sonos API reports {}", status),
            Ok(_) => debug!("Gateway reply carried no status"),
            Err(e) => debug!(error = %e, "Gateway reply is not a status object"),
        }
        Ok(())
    }

    fn zones(&self) -> Result<Vec<Zone>, TargetError> {
        let url = self.url(["zones"])?;
        Ok(self.get(url)?.json()?)
    }
}

/// One room behind the gateway
#[derive(Debug, Clone)]
pub struct GatewayTarget {
    client: Arc<GatewayClient>,
    room: String,
}

impl GatewayTarget {
    pub fn new(client: Arc<GatewayClient>, room: impl Into<String>) -> Self {
        Self {
            client,
            room: room.into(),
        }
    }

    fn action(&self, path: &str) -> Result<(), TargetError> {
        self.client.action(&self.room, path)
    }
}

impl Target for GatewayTarget {
    fn player_name(&self) -> &str {
        &self.room
    }

    fn play(&self, media: &Media) -> Result<(), TargetError> {
        self.action(&media.gateway_path())
    }

    fn open_url(&self, url: &str) -> Result<(), TargetError> {
        let url = Url::parse(url)
            .map_err(|e| TargetError::Unsupported(format!("Invalid URL '{}': {}", url, e)))?;
        self.client.fetch(url)
    }

    fn resume(&self) -> Result<(), TargetError> {
        self.action("play")
    }

    fn pause(&self) -> Result<(), TargetError> {
        self.action("pause")
    }

    fn next(&self) -> Result<(), TargetError> {
        self.action("next")
    }

    fn previous(&self) -> Result<(), TargetError> {
        self.action("previous")
    }

    fn adjust_volume(&self, delta: i8) -> Result<(), TargetError> {
        self.action(&volume_path(delta))
    }

    fn clear_queue(&self) -> Result<(), TargetError> {
        self.action("clearqueue")
    }

    fn list_favorites(&self) -> Result<Vec<Favorite>, TargetError> {
        let url = self.client.room_url(&self.room, "favorites")?;
        let titles: Vec<String> = self.client.get(url)?.json()?;
        Ok(titles.into_iter().map(Favorite::titled).collect())
    }

    fn play_favorite(&self, favorite: &Favorite) -> Result<(), TargetError> {
        let url = self
            .client
            .url([self.room.as_str(), "favorite", favorite.title.as_str()])?;
        self.client.fetch(url)
    }
}

/// Every room the gateway knows, zone coordinators first
#[derive(Debug, Clone)]
pub struct GatewayFleet {
    client: Arc<GatewayClient>,
}

impl GatewayFleet {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }
}

impl Fleet for GatewayFleet {
    fn enumerate(&self) -> Result<Vec<TargetHandle>, TargetError> {
        let zones = self.client.zones()?;
        let mut rooms: Vec<String> = Vec::new();
        for zone in zones {
            for member in std::iter::once(zone.coordinator).chain(zone.members) {
                if !rooms.contains(&member.room_name) {
                    rooms.push(member.room_name);
                }
            }
        }

        Ok(rooms
            .into_iter()
            .map(|room| Arc::new(GatewayTarget::new(self.client.clone(), room)) as TargetHandle)
            .collect())
    }
}

fn volume_path(delta: i8) -> String {
    format!("volume/{:+}", delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GatewayClient {
        GatewayClient::new(Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_room_url_encodes_room() {
        let url = client("http://localhost:5005")
            .room_url("Living Room", "spotify/now/spotify:album:1DFix")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5005/Living%20Room/spotify/now/spotify:album:1DFix"
        );
    }

    #[test]
    fn test_room_url_keeps_base_path() {
        let url = client("http://pi.local/sonos/").room_url("Kitchen", "clearqueue").unwrap();
        assert_eq!(url.as_str(), "http://pi.local/sonos/Kitchen/clearqueue");
    }

    #[test]
    fn test_room_url_keeps_query_in_payload() {
        let url = client("http://localhost:5005")
            .room_url("Kitchen", "spotify/now/spotify:playlist:37i9dQZF1DX?si=abc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5005/Kitchen/spotify/now/spotify:playlist:37i9dQZF1DX?si=abc"
        );
        assert_eq!(url.query(), Some("si=abc"));
    }

    #[test]
    fn test_room_url_does_not_reencode_escapes() {
        let url = client("http://localhost:5005")
            .room_url("Living Room", "tunein/play/Radio%20X")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5005/Living%20Room/tunein/play/Radio%20X");
    }

    #[test]
    fn test_volume_path_is_signed() {
        assert_eq!(volume_path(5), "volume/+5");
        assert_eq!(volume_path(-5), "volume/-5");
    }

    #[test]
    fn test_cannot_be_a_base_rejected() {
        let err = GatewayClient::new(Url::parse("mailto:sonos@example.com").unwrap(), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, TargetError::Unsupported(_)));
    }

    #[test]
    fn test_zones_deserialize() {
        let zones: Vec<Zone> = serde_json::from_str(
            r#"[{"uuid":"RINCON_1","coordinator":{"roomName":"Kitchen","state":{}},"members":[{"roomName":"Kitchen"},{"roomName":"Dining"}]}]"#,
        )
        .unwrap();
        assert_eq!(zones[0].coordinator.room_name, "Kitchen");
        assert_eq!(zones[0].members.len(), 2);
    }
}
