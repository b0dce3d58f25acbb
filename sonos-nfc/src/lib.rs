//! Sonos playback control from NFC tags
//!
//! Each tag carries a short text. The text is classified into a
//! [`Directive`](directive::Directive), and the [`Executor`](executor::Executor)
//! turns the directive into calls against the speaker selected for the current
//! room:
//!
//! ```text
//! TagSource ──> Dispatcher ──> parse() ──> Executor ──> Target (gateway | direct)
//!                   │                         │
//!                   └──── Session <── room ───┘── Registry ──> Fleet
//! ```
//!
//! | Tag text | Effect |
//! |---|---|
//! | `spotify:album:<id>` | clear queue, play album |
//! | `tunein/play/<station>` | clear queue, play station |
//! | `amazonmusic:song:<asin>`, `apple:album:<id>`, `bbcsounds:<station>` | clear queue, play |
//! | `favorite:<title>` | clear queue, play the favourite with that title |
//! | `http...` | clear queue, fetch the URL as-is |
//! | `command:pause` (play, next, previous, volume_up, volume_down) | transport/volume control |
//! | `room:<name>` | select the speaker for subsequent tags |

pub mod command;
pub mod config;
pub mod directive;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod logging;
pub mod registry;
pub mod session;
pub mod tag;
pub mod target;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use command::CommandAction;
pub use config::{Args, Backend, Config};
pub use directive::{parse, Directive, DirectiveKind, Media, MusicService};
pub use dispatcher::{DispatchState, Dispatcher};
pub use error::{ConfigError, ExecError, ReaderInitError, RegistryError, TagReadError, TargetError};
pub use executor::{Executor, Outcome, SkipReason};
pub use registry::{Registry, Resolution};
pub use session::Session;
pub use tag::{LineTagSource, NdefMessage, NdefRecord, TagRead, TagSource};
pub use target::{Favorite, Fleet, Target, TargetHandle};
pub use telemetry::{HttpTelemetry, NoTelemetry, TelemetrySink};
