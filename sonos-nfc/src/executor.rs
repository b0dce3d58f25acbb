//! Turning directives into target calls

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::command::CommandAction;
use crate::directive::{Directive, DirectiveKind};
use crate::error::ExecError;
use crate::registry::Registry;
use crate::session::Session;
use crate::target::{Target, TargetHandle};
use crate::telemetry::TelemetrySink;

/// Default volume change for `command:volume_up` / `command:volume_down`
pub const DEFAULT_VOLUME_STEP: u8 = 5;

/// Telemetry message for tag text that matched no prefix
pub const INVALID_SERVICE_TYPE: &str = "invalid service type sent";

const FAVORITE_PREFIX_LEN: usize = 8;

/// What executing a directive amounted to
#[derive(Debug)]
pub enum Outcome {
    /// The target was driven as requested
    Executed,
    /// A room directive selected a new target
    SessionChanged(Session),
    /// Nothing was sent to the target
    Skipped(SkipReason),
}

/// Why a directive was handled without acting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unrecognized,
    UnknownCommand(String),
    FavoriteNotFound(String),
}

/// Executes directives against the session's target
pub struct Executor {
    registry: Registry,
    telemetry: Arc<dyn TelemetrySink>,
    volume_step: u8,
}

impl Executor {
    pub fn new(registry: Registry, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            registry,
            telemetry,
            volume_step: DEFAULT_VOLUME_STEP,
        }
    }

    pub fn with_volume_step(mut self, volume_step: u8) -> Self {
        self.volume_step = volume_step;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute one directive
    ///
    /// Room directives never touch playback; they resolve a target and hand
    /// back the new session. Every other recognised directive except commands
    /// clears the queue first. A failed clear is logged and the play request
    /// is still sent.
    pub fn execute(&self, directive: &Directive, session: &Session) -> Result<Outcome, ExecError> {
        match directive.kind() {
            DirectiveKind::Room => return self.change_room(directive.payload(), session),
            DirectiveKind::Unrecognized => {
                warn!(
                    "Service type not recognised. Tag text should begin with http, spotify, \
                     tunein, favorite, amazonmusic, apple/applemusic, bbcsounds, command or room"
                );
                self.telemetry.report(INVALID_SERVICE_TYPE);
                return Ok(Outcome::Skipped(SkipReason::Unrecognized));
            }
            _ => {}
        }

        let target = session
            .target()
            .ok_or_else(|| ExecError::NoTarget(session.room_name().to_string()))?;

        info!(
            kind = %directive.kind(),
            room = target.player_name(),
            "Detected {} request",
            directive.kind()
        );

        if directive.kind() == DirectiveKind::Command {
            return self.run_command(directive.payload(), target.as_ref());
        }

        self.clear_queue(target);

        match directive.kind() {
            DirectiveKind::CompleteUrl => {
                info!(url = directive.payload(), "Fetching URL");
                target.open_url(directive.payload())?;
            }
            DirectiveKind::Favorite => {
                return self.play_favorite(favorite_title(directive.payload()), target.as_ref());
            }
            _ => {
                if let Some(media) = directive.media() {
                    debug!(path = %media.gateway_path(), "Starting media");
                    target.play(&media)?;
                }
            }
        }

        Ok(Outcome::Executed)
    }

    /// Select a target for the session's room if it has none yet
    ///
    /// Used when the fleet could not be enumerated at startup; the room name
    /// is resolved again on every call until it succeeds.
    pub fn attach(&self, session: &Session) -> Result<Session, ExecError> {
        if session.target().is_some() {
            return Ok(session.clone());
        }

        let resolution = self.registry.resolve(session.room_name())?;
        let player_name = resolution.target.player_name().to_string();
        info!(
            requested = session.room_name(),
            room = %player_name,
            fallback = resolution.fallback,
            "Speaker selected"
        );
        Ok(session.with_room(player_name, resolution.target))
    }

    fn change_room(&self, room_name: &str, session: &Session) -> Result<Outcome, ExecError> {
        let resolution = self.registry.resolve(room_name)?;
        let player_name = resolution.target.player_name().to_string();
        info!(
            requested = room_name,
            room = %player_name,
            fallback = resolution.fallback,
            "Sonos room changed"
        );
        Ok(Outcome::SessionChanged(
            session.with_room(player_name, resolution.target),
        ))
    }

    fn run_command(&self, name: &str, target: &dyn Target) -> Result<Outcome, ExecError> {
        let Some(action) = CommandAction::from_name(name) else {
            info!(command = name, "Unknown command, ignoring");
            return Ok(Outcome::Skipped(SkipReason::UnknownCommand(name.to_string())));
        };

        info!(command = %action, room = target.player_name(), "Sending command");
        action.apply(target, self.volume_step)?;
        Ok(Outcome::Executed)
    }

    fn clear_queue(&self, target: &TargetHandle) {
        info!(room = target.player_name(), "Clearing Sonos queue");
        if let Err(e) = target.clear_queue() {
            warn!(room = target.player_name(), error = %e, "Failed to clear queue, continuing");
        }
    }

    fn play_favorite(&self, title: &str, target: &dyn Target) -> Result<Outcome, ExecError> {
        let wanted = title.to_lowercase();
        let favorites = target.list_favorites()?;

        match favorites.iter().find(|f| f.title.to_lowercase() == wanted) {
            Some(favorite) => {
                info!(favorite = %favorite.title, room = target.player_name(), "Playing favourite");
                target.play_favorite(favorite)?;
                Ok(Outcome::Executed)
            }
            None => {
                warn!(
                    favorite = title,
                    available = favorites.len(),
                    "Favourite not found"
                );
                Ok(Outcome::Skipped(SkipReason::FavoriteNotFound(title.to_string())))
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("volume_step", &self.volume_step)
            .finish_non_exhaustive()
    }
}

/// Favourite title from a favourite payload
///
/// `favorite/Jazz`, `Favorite: jazz` and `favorite:Jazz` all name `Jazz`.
pub fn favorite_title(payload: &str) -> &str {
    payload
        .char_indices()
        .nth(FAVORITE_PREFIX_LEN)
        .map(|(idx, _)| &payload[idx..])
        .unwrap_or("")
        .trim_start_matches(|c: char| c == ':' || c == '/' || c.is_whitespace())
        .trim_end()
}
