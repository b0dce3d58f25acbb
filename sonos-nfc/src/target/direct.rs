//! Direct UPnP control of zone players
//!
//! No gateway in between: each configured speaker is addressed on port 1400
//! with SOAP requests from `sonos-api`. Music-service references are turned
//! into transport URIs with the share-link conventions of the Sonos apps.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use sonos_api::device::{DeviceDescription, DESCRIPTION_PATH};
use sonos_api::didl::{parse_favorites, FavoriteItem};
use sonos_api::operations::av_transport::{
    AddUriToQueueOperation, AddUriToQueueRequest, NextOperation, NextRequest, PauseOperation,
    PauseRequest, PlayOperation, PlayRequest, PreviousOperation, PreviousRequest,
    RemoveAllTracksFromQueueOperation, RemoveAllTracksFromQueueRequest, SeekOperation,
    SeekRequest, SetAvTransportUriOperation, SetAvTransportUriRequest,
};
use sonos_api::operations::content_directory::{BrowseOperation, BrowseRequest, FAVORITES_OBJECT_ID};
use sonos_api::operations::rendering_control::{SetRelativeVolumeOperation, SetRelativeVolumeRequest};
use sonos_api::share_link::{self, PlayMode, Playable};
use sonos_api::{SonosClient, DEFAULT_PORT};
use tracing::{debug, info};

use crate::directive::{Media, MusicService};
use crate::error::{ConfigError, TargetError};
use crate::target::{Favorite, Fleet, Target, TargetHandle};

const INSTANCE_ID: u32 = 0;

/// A configured speaker: `ROOM=HOST[:PORT]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerAddress {
    pub room: String,
    pub host: String,
    pub port: u16,
}

impl SpeakerAddress {
    /// `host:port` as used for SOAP and HTTP requests
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromStr for SpeakerAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Speaker(s.to_string());

        let (room, address) = s.split_once('=').ok_or_else(invalid)?;
        let (room, address) = (room.trim(), address.trim());
        if room.is_empty() || address.is_empty() {
            return Err(invalid());
        }

        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (address, DEFAULT_PORT),
        };
        if host.is_empty() || host.contains(['/', ' ']) {
            return Err(invalid());
        }

        Ok(Self {
            room: room.to_string(),
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for SpeakerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}:{}", self.room, self.host, self.port)
    }
}

/// One zone player controlled over UPnP
pub struct DirectTarget {
    address: SpeakerAddress,
    client: SonosClient,
    http: reqwest::blocking::Client,
    rincon_id: OnceLock<String>,
}

impl DirectTarget {
    pub fn new(address: SpeakerAddress, client: SonosClient, http: reqwest::blocking::Client) -> Self {
        Self {
            address,
            client,
            http,
            rincon_id: OnceLock::new(),
        }
    }

    pub fn address(&self) -> &SpeakerAddress {
        &self.address
    }

    fn host(&self) -> String {
        self.address.authority()
    }

    /// The player's `RINCON_...` id, fetched once from its device description
    fn rincon_id(&self) -> Result<String, TargetError> {
        if let Some(id) = self.rincon_id.get() {
            return Ok(id.clone());
        }

        let url = format!("http://{}/{}", self.host(), DESCRIPTION_PATH);
        let xml = self.http.get(&url).send()?.error_for_status()?.text()?;
        let id = DeviceDescription::from_xml(&xml)?.rincon_id().to_string();
        debug!(room = %self.address.room, rincon = %id, "Read device description");

        Ok(self.rincon_id.get_or_init(|| id).clone())
    }

    fn start(&self, playable: &Playable) -> Result<(), TargetError> {
        let host = self.host();
        match playable.mode {
            PlayMode::Stream => {
                self.client.execute::<SetAvTransportUriOperation>(
                    &host,
                    &SetAvTransportUriRequest {
                        instance_id: INSTANCE_ID,
                        current_uri: playable.uri.clone(),
                        current_uri_meta_data: playable.metadata.clone(),
                    },
                )?;
            }
            PlayMode::Queue => {
                let queued = self.client.execute::<AddUriToQueueOperation>(
                    &host,
                    &AddUriToQueueRequest {
                        instance_id: INSTANCE_ID,
                        enqueued_uri: playable.uri.clone(),
                        enqueued_uri_meta_data: playable.metadata.clone(),
                        desired_first_track_number_enqueued: 0,
                        enqueue_as_next: false,
                    },
                )?;
                debug!(
                    first = queued.first_track_number_enqueued,
                    added = queued.num_tracks_added,
                    "Queued"
                );

                self.client.execute::<SetAvTransportUriOperation>(
                    &host,
                    &SetAvTransportUriRequest {
                        instance_id: INSTANCE_ID,
                        current_uri: share_link::queue_uri(&self.rincon_id()?),
                        current_uri_meta_data: String::new(),
                    },
                )?;

                if queued.first_track_number_enqueued > 1 {
                    self.client.execute::<SeekOperation>(
                        &host,
                        &SeekRequest {
                            instance_id: INSTANCE_ID,
                            unit: "TRACK_NR".to_string(),
                            target: queued.first_track_number_enqueued.to_string(),
                        },
                    )?;
                }
            }
        }
        self.resume()
    }
}

impl fmt::Debug for DirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectTarget")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Target for DirectTarget {
    fn player_name(&self) -> &str {
        &self.address.room
    }

    fn play(&self, media: &Media) -> Result<(), TargetError> {
        let reference = media.reference();
        let playable = match media.service {
            MusicService::Spotify => share_link::spotify(reference)?,
            MusicService::TuneIn => share_link::tunein(reference)?,
            MusicService::AmazonMusic => share_link::amazon_music(reference)?,
            MusicService::AppleMusic => share_link::apple_music(reference)?,
            MusicService::BbcSounds => {
                return Err(TargetError::Unsupported(
                    "BBC Sounds needs the HTTP gateway".to_string(),
                ))
            }
        };
        info!(room = %self.address.room, uri = %playable.uri, "Starting playback");
        self.start(&playable)
    }

    fn open_url(&self, url: &str) -> Result<(), TargetError> {
        let response = self.http.get(url).send()?.error_for_status()?;
        debug!(status = %response.status(), "Fetched URL");
        Ok(())
    }

    fn resume(&self) -> Result<(), TargetError> {
        self.client.execute::<PlayOperation>(
            &self.host(),
            &PlayRequest {
                instance_id: INSTANCE_ID,
                speed: "1".to_string(),
            },
        )?;
        Ok(())
    }

    fn pause(&self) -> Result<(), TargetError> {
        self.client
            .execute::<PauseOperation>(&self.host(), &PauseRequest { instance_id: INSTANCE_ID })?;
        Ok(())
    }

    fn next(&self) -> Result<(), TargetError> {
        self.client
            .execute::<NextOperation>(&self.host(), &NextRequest { instance_id: INSTANCE_ID })?;
        Ok(())
    }

    fn previous(&self) -> Result<(), TargetError> {
        self.client.execute::<PreviousOperation>(
            &self.host(),
            &PreviousRequest { instance_id: INSTANCE_ID },
        )?;
        Ok(())
    }

    fn adjust_volume(&self, delta: i8) -> Result<(), TargetError> {
        let response = self.client.execute::<SetRelativeVolumeOperation>(
            &self.host(),
            &SetRelativeVolumeRequest {
                instance_id: INSTANCE_ID,
                channel: "Master".to_string(),
                adjustment: delta,
            },
        )?;
        info!(room = %self.address.room, volume = response.new_volume, "Volume changed");
        Ok(())
    }

    fn clear_queue(&self) -> Result<(), TargetError> {
        self.client.execute::<RemoveAllTracksFromQueueOperation>(
            &self.host(),
            &RemoveAllTracksFromQueueRequest { instance_id: INSTANCE_ID },
        )?;
        Ok(())
    }

    fn list_favorites(&self) -> Result<Vec<Favorite>, TargetError> {
        let response = self
            .client
            .execute::<BrowseOperation>(&self.host(), &BrowseRequest::children(FAVORITES_OBJECT_ID))?;
        let favorites = parse_favorites(&response.result)?;
        debug!(count = favorites.len(), total = response.total_matches, "Read favourites");

        Ok(favorites
            .into_iter()
            .map(|item| Favorite {
                id: item.id,
                title: item.title,
                uri: item.uri,
                metadata: item.metadata,
            })
            .collect())
    }

    fn play_favorite(&self, favorite: &Favorite) -> Result<(), TargetError> {
        let item = FavoriteItem {
            id: favorite.id.clone(),
            title: favorite.title.clone(),
            uri: favorite.uri.clone(),
            metadata: favorite.metadata.clone(),
        };
        let uri = item.uri.clone().ok_or_else(|| {
            TargetError::Unsupported(format!("Favourite '{}' has no playable URI", favorite.title))
        })?;

        let playable = Playable {
            uri,
            metadata: item.metadata.clone().unwrap_or_default(),
            mode: if item.is_container() {
                PlayMode::Queue
            } else {
                PlayMode::Stream
            },
        };
        self.start(&playable)
    }
}

/// The speakers listed in the configuration
#[derive(Debug, Clone)]
pub struct DirectFleet {
    speakers: Vec<SpeakerAddress>,
    client: SonosClient,
    http: reqwest::blocking::Client,
}

impl DirectFleet {
    pub fn new(speakers: Vec<SpeakerAddress>, timeout: Duration) -> Result<Self, TargetError> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            speakers,
            client: SonosClient::with_timeout(timeout),
            http,
        })
    }
}

impl Fleet for DirectFleet {
    fn enumerate(&self) -> Result<Vec<TargetHandle>, TargetError> {
        Ok(self
            .speakers
            .iter()
            .map(|address| {
                Arc::new(DirectTarget::new(
                    address.clone(),
                    self.client.clone(),
                    self.http.clone(),
                )) as TargetHandle
            })
            .collect())
    }
}
