//! Controllable speakers
//!
//! The executor only ever talks to [`Target`]. Two backends implement it:
//!
//! - [`gateway`]: path-style requests against a node-sonos-http-api style
//!   HTTP gateway (`GET <base>/<room>/<action...>`)
//! - [`direct`]: UPnP control requests sent straight to the zone player
//!
//! A [`Fleet`] enumerates the targets a backend can reach; the registry picks
//! one per room.

use std::fmt;
use std::sync::Arc;

use crate::directive::Media;
use crate::error::TargetError;

pub mod direct;
pub mod gateway;

/// A named, platform-stored playable preset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    /// Platform id (`FV:2/15` for direct control, the title for the gateway)
    pub id: String,
    pub title: String,
    /// Transport URI, known only for direct control
    pub uri: Option<String>,
    /// DIDL metadata accompanying `uri`
    pub metadata: Option<String>,
}

impl Favorite {
    /// A favourite known only by its title
    pub fn titled(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: title.clone(),
            title,
            uri: None,
            metadata: None,
        }
    }
}

/// A speaker or group that accepts playback control
///
/// All calls block until the platform answered or the backend's request
/// timeout elapsed.
pub trait Target: Send + Sync {
    /// Room name as reported by the platform
    fn player_name(&self) -> &str;

    /// Start music-service content
    fn play(&self, media: &Media) -> Result<(), TargetError>;

    /// Activate a literal URL
    fn open_url(&self, url: &str) -> Result<(), TargetError>;

    fn resume(&self) -> Result<(), TargetError>;

    fn pause(&self) -> Result<(), TargetError>;

    fn next(&self) -> Result<(), TargetError>;

    fn previous(&self) -> Result<(), TargetError>;

    /// Change the volume by `delta` percentage points
    fn adjust_volume(&self, delta: i8) -> Result<(), TargetError>;

    fn clear_queue(&self) -> Result<(), TargetError>;

    fn list_favorites(&self) -> Result<Vec<Favorite>, TargetError>;

    fn play_favorite(&self, favorite: &Favorite) -> Result<(), TargetError>;
}

/// Shared handle to a target; replaced, never mutated, on room change
pub type TargetHandle = Arc<dyn Target>;

/// The set of targets reachable through one backend
pub trait Fleet: Send + Sync {
    /// Every target currently available, in platform order
    fn enumerate(&self) -> Result<Vec<TargetHandle>, TargetError>;
}

impl fmt::Debug for dyn Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("player_name", &self.player_name())
            .finish()
    }
}
