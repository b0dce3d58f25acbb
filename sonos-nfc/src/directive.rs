//! Tag text classification
//!
//! A tag carries a short text such as `spotify:album:1DFix...`,
//! `command:pause` or `room:Kitchen`. [`parse`] matches it against an ordered
//! prefix table and produces an immutable [`Directive`].
//!
//! Matching is ASCII case-insensitive and never changes the payload's case.
//! The table is ordered so that a prefix that extends another prefix is tried
//! first (`applemusic:` before `apple:`); the first matching rule wins.

use std::fmt;

/// What a tag asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    CompleteUrl,
    Spotify,
    TuneIn,
    Favorite,
    AmazonMusic,
    AppleMusic,
    BbcSounds,
    Command,
    Room,
    Unrecognized,
}

impl DirectiveKind {
    /// Lower-case name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveKind::CompleteUrl => "completeurl",
            DirectiveKind::Spotify => "spotify",
            DirectiveKind::TuneIn => "tunein",
            DirectiveKind::Favorite => "favorite",
            DirectiveKind::AmazonMusic => "amazonmusic",
            DirectiveKind::AppleMusic => "applemusic",
            DirectiveKind::BbcSounds => "bbcsounds",
            DirectiveKind::Command => "command",
            DirectiveKind::Room => "room",
            DirectiveKind::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    kind: DirectiveKind,
    payload: String,
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The music-service request carried by this directive, if any
    pub fn media(&self) -> Option<Media> {
        let service = match self.kind {
            DirectiveKind::Spotify => MusicService::Spotify,
            DirectiveKind::TuneIn => MusicService::TuneIn,
            DirectiveKind::AmazonMusic => MusicService::AmazonMusic,
            DirectiveKind::AppleMusic => MusicService::AppleMusic,
            DirectiveKind::BbcSounds => MusicService::BbcSounds,
            _ => return None,
        };
        Some(Media {
            service,
            payload: self.payload.clone(),
        })
    }

    fn unrecognized() -> Self {
        Self {
            kind: DirectiveKind::Unrecognized,
            payload: String::new(),
        }
    }
}

/// Streaming services a tag can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicService {
    Spotify,
    TuneIn,
    AmazonMusic,
    AppleMusic,
    BbcSounds,
}

/// A music-service request handed to a target's `play`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub service: MusicService,
    /// Directive payload, unchanged
    pub payload: String,
}

impl Media {
    /// Path below `<gateway>/<room>/` that starts this media on the gateway
    pub fn gateway_path(&self) -> String {
        match self.service {
            MusicService::AmazonMusic => format!("amazonmusic/now/{}", self.payload),
            MusicService::AppleMusic => format!("applemusic/now/{}", self.payload),
            MusicService::Spotify | MusicService::TuneIn | MusicService::BbcSounds => {
                self.payload.clone()
            }
        }
    }

    /// The service's own reference, without any gateway path segments
    pub fn reference(&self) -> &str {
        match self.service {
            MusicService::Spotify => self.payload.strip_prefix(SPOTIFY_PATH).unwrap_or(&self.payload),
            MusicService::BbcSounds => self.payload.strip_prefix(BBC_SOUNDS_PATH).unwrap_or(&self.payload),
            MusicService::TuneIn | MusicService::AmazonMusic | MusicService::AppleMusic => {
                &self.payload
            }
        }
    }
}

const SPOTIFY_PATH: &str = "spotify/now/";
const BBC_SOUNDS_PATH: &str = "bbcsounds/play/";

/// How the payload is cut out of the original text
#[derive(Debug, Clone, Copy)]
enum Extract {
    /// The whole original text
    Whole,
    /// A gateway path prefix followed by the whole original text
    PrefixedWhole(&'static str),
    /// Everything after the first `n` characters
    After(usize),
    /// A gateway path prefix followed by everything after the first `n` characters
    PrefixedAfter(&'static str, usize),
    /// Everything after the first `n` characters, surrounding whitespace removed
    TrimmedAfter(usize),
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    prefix: &'static str,
    kind: DirectiveKind,
    extract: Extract,
}

const RULES: &[Rule] = &[
    Rule { prefix: "http", kind: DirectiveKind::CompleteUrl, extract: Extract::Whole },
    Rule { prefix: "spotify", kind: DirectiveKind::Spotify, extract: Extract::PrefixedWhole(SPOTIFY_PATH) },
    Rule { prefix: "tunein", kind: DirectiveKind::TuneIn, extract: Extract::Whole },
    Rule { prefix: "favorite", kind: DirectiveKind::Favorite, extract: Extract::Whole },
    Rule { prefix: "amazonmusic:", kind: DirectiveKind::AmazonMusic, extract: Extract::After(12) },
    Rule { prefix: "applemusic:", kind: DirectiveKind::AppleMusic, extract: Extract::After(11) },
    Rule { prefix: "apple:", kind: DirectiveKind::AppleMusic, extract: Extract::After(6) },
    Rule { prefix: "bbcsounds:", kind: DirectiveKind::BbcSounds, extract: Extract::PrefixedAfter(BBC_SOUNDS_PATH, 10) },
    Rule { prefix: "command", kind: DirectiveKind::Command, extract: Extract::After(8) },
    Rule { prefix: "room", kind: DirectiveKind::Room, extract: Extract::TrimmedAfter(5) },
];

/// Classify raw tag text
///
/// Never fails: text matching no prefix yields [`DirectiveKind::Unrecognized`].
pub fn parse(raw_text: &str) -> Directive {
    RULES
        .iter()
        .find(|rule| starts_with_ignore_case(raw_text, rule.prefix))
        .map(|rule| Directive {
            kind: rule.kind,
            payload: extract(raw_text, rule.extract),
        })
        .unwrap_or_else(Directive::unrecognized)
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.as_bytes()
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
        .unwrap_or(false)
}

fn extract(text: &str, extract: Extract) -> String {
    match extract {
        Extract::Whole => text.to_string(),
        Extract::PrefixedWhole(path) => format!("{}{}", path, text),
        Extract::After(n) => skip_chars(text, n).to_string(),
        Extract::PrefixedAfter(path, n) => format!("{}{}", path, skip_chars(text, n)),
        Extract::TrimmedAfter(n) => skip_chars(text, n).trim().to_string(),
    }
}

/// Drop the first `n` characters; shorter text leaves nothing
fn skip_chars(text: &str, n: usize) -> &str {
    text.char_indices()
        .nth(n)
        .map(|(idx, _)| &text[idx..])
        .unwrap_or("")
}
