//! The currently selected room

use std::fmt;

use crate::target::TargetHandle;

/// Room and target selected for subsequent tags
///
/// Owned by the dispatch loop. A room change produces a new `Session`; the
/// old one is dropped along with its target handle.
#[derive(Clone)]
pub struct Session {
    room_name: String,
    target: Option<TargetHandle>,
}

impl Session {
    /// A session for `room_name` with no target resolved yet
    pub fn new(room_name: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            target: None,
        }
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn target(&self) -> Option<&TargetHandle> {
        self.target.as_ref()
    }

    /// The session that results from selecting `target` for `room_name`
    pub fn with_room(&self, room_name: impl Into<String>, target: TargetHandle) -> Self {
        Self {
            room_name: room_name.into(),
            target: Some(target),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("room_name", &self.room_name)
            .field("target", &self.target.as_ref().map(|t| t.player_name()))
            .finish()
    }
}
