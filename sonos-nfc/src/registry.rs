//! Room name to target resolution

use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::target::{Fleet, TargetHandle};

/// Outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    pub target: TargetHandle,
    /// The requested room was not found and another target was picked
    pub fallback: bool,
}

/// Resolves room names against the fleet
///
/// The fleet is enumerated on every resolution so that speakers added or
/// renamed since startup are picked up on the next `room:` tag.
pub struct Registry {
    fleet: Box<dyn Fleet>,
}

impl Registry {
    pub fn new(fleet: impl Fleet + 'static) -> Self {
        Self {
            fleet: Box::new(fleet),
        }
    }

    /// Find the target for `room_name`
    ///
    /// Room names are compared ignoring ASCII case and surrounding whitespace.
    /// A miss falls back to the first enumerated target with a warning; only an
    /// empty fleet is an error.
    pub fn resolve(&self, room_name: &str) -> Result<Resolution, RegistryError> {
        let targets = self.fleet.enumerate()?;
        debug!(room = room_name, available = targets.len(), "Resolving room");

        let wanted = room_name.trim();
        if let Some(target) = targets
            .iter()
            .find(|t| t.player_name().trim().eq_ignore_ascii_case(wanted))
        {
            return Ok(Resolution {
                target: target.clone(),
                fallback: false,
            });
        }

        let target = targets
            .into_iter()
            .next()
            .ok_or(RegistryError::TargetNotFound)?;
        warn!(
            room = room_name,
            fallback = target.player_name(),
            "Room not found, using fallback speaker"
        );

        Ok(Resolution {
            target,
            fallback: true,
        })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}
