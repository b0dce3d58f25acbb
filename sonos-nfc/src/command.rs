//! Zero-argument transport commands (`command:<name>` tags)

use std::fmt;

use crate::error::TargetError;
use crate::target::Target;

/// A named transport or volume action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    Play,
    Pause,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
}

impl CommandAction {
    pub const ALL: [CommandAction; 6] = [
        CommandAction::Play,
        CommandAction::Pause,
        CommandAction::Next,
        CommandAction::Previous,
        CommandAction::VolumeUp,
        CommandAction::VolumeDown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CommandAction::Play => "play",
            CommandAction::Pause => "pause",
            CommandAction::Next => "next",
            CommandAction::Previous => "previous",
            CommandAction::VolumeUp => "volume_up",
            CommandAction::VolumeDown => "volume_down",
        }
    }

    /// Look up a command by name, ignoring ASCII case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(name))
    }

    /// Run the action against `target`; volume actions move by `volume_step`
    pub fn apply(&self, target: &dyn Target, volume_step: u8) -> Result<(), TargetError> {
        let step = i8::try_from(volume_step).unwrap_or(i8::MAX);
        match self {
            CommandAction::Play => target.resume(),
            CommandAction::Pause => target.pause(),
            CommandAction::Next => target.next(),
            CommandAction::Previous => target.previous(),
            CommandAction::VolumeUp => target.adjust_volume(step),
            CommandAction::VolumeDown => target.adjust_volume(-step),
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
