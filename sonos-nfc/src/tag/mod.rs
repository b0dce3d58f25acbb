//! Tag sources
//!
//! A [`TagSource`] is polled by the dispatch loop and yields at most one tag
//! per poll. The NFC physical layer lives outside this crate; a reader bridge
//! hands over NDEF dumps through [`LineTagSource`].

use std::time::Duration;

use crate::error::TagReadError;

pub mod line;
pub mod ndef;

pub use line::LineTagSource;
pub use ndef::{NdefMessage, NdefRecord};

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRead {
    /// No tag was presented before the timeout
    Idle,
    /// A tag was presented but carried no NDEF message
    Blank,
    Message(NdefMessage),
}

/// Something that reports tags, one at a time
pub trait TagSource {
    /// Wait up to `timeout` for the next tag
    ///
    /// [`TagReadError::Closed`] means the source is gone for good; any other
    /// error concerns only the tag that was just presented.
    fn poll(&mut self, timeout: Duration) -> Result<TagRead, TagReadError>;
}
