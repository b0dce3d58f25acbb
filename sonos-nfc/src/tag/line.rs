//! Line-oriented reader bridge
//!
//! Reads one tag per line from a device node, FIFO or stdin (`-`):
//!
//! - `ndef:<hex>`: a raw NDEF message as read from the tag
//! - an empty line: a tag without NDEF data
//! - anything else: the text of a single text record
//!
//! Lines are read on a dedicated thread so that polling can time out.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use tracing::{debug, trace};

use crate::error::{ReaderInitError, TagReadError};
use crate::tag::{NdefMessage, TagRead, TagSource};

/// Path that selects standard input
pub const STDIN_PATH: &str = "-";

const NDEF_PREFIX: &str = "ndef:";

/// Tags arriving as lines of text
#[derive(Debug)]
pub struct LineTagSource {
    lines: Receiver<io::Result<String>>,
    name: String,
}

impl LineTagSource {
    /// Open a reader device, FIFO or `-` for stdin
    pub fn open(path: &Path) -> Result<Self, ReaderInitError> {
        if path == Path::new(STDIN_PATH) {
            return Self::from_reader(BufReader::new(io::stdin()), "stdin");
        }

        let file = File::open(path).map_err(|source| ReaderInitError::Open {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Read tags from any buffered reader
    pub fn from_reader<R>(reader: R, name: &str) -> Result<Self, ReaderInitError>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = channel::bounded(16);

        thread::Builder::new()
            .name("tag-reader".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.send(line).is_err() || failed {
                        break;
                    }
                }
                debug!("Tag reader stream ended");
            })
            .map_err(ReaderInitError::Thread)?;

        Ok(Self {
            lines: rx,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TagSource for LineTagSource {
    fn poll(&mut self, timeout: Duration) -> Result<TagRead, TagReadError> {
        match self.lines.recv_timeout(timeout) {
            Ok(Ok(line)) => {
                trace!(line = %line, "Reader line");
                parse_line(&line)
            }
            Ok(Err(e)) => Err(TagReadError::Io(e.to_string())),
            Err(RecvTimeoutError::Timeout) => Ok(TagRead::Idle),
            Err(RecvTimeoutError::Disconnected) => Err(TagReadError::Closed),
        }
    }
}

/// Interpret one line from the reader bridge
pub fn parse_line(line: &str) -> Result<TagRead, TagReadError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(TagRead::Blank);
    }

    let is_dump = line
        .get(..NDEF_PREFIX.len())
        .map(|head| head.eq_ignore_ascii_case(NDEF_PREFIX))
        .unwrap_or(false);
    if !is_dump {
        return Ok(TagRead::Message(NdefMessage::from_text(line)));
    }

    let hex_dump: String = line[NDEF_PREFIX.len()..]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = hex::decode(&hex_dump).map_err(|e| TagReadError::Malformed(e.to_string()))?;
    let message = NdefMessage::parse(&bytes)?;

    Ok(if message.is_empty() {
        TagRead::Blank
    } else {
        TagRead::Message(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn texts(read: TagRead) -> Vec<String> {
        match read {
            TagRead::Message(message) => message
                .records
                .iter()
                .map(|r| r.text().unwrap())
                .collect(),
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_line() {
        assert_eq!(texts(parse_line("command:pause\r\n").unwrap()), vec!["command:pause"]);
    }

    #[test]
    fn test_ndef_dump_line() {
        let read = parse_line("NDEF: d1 01 12 54 02 65 6e 73706f746966793a747261636b3a31").unwrap();
        assert_eq!(texts(read), vec!["spotify:track:1"]);
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(parse_line("").unwrap(), TagRead::Blank);
        assert_eq!(parse_line("   ").unwrap(), TagRead::Blank);
        assert_eq!(parse_line("ndef:").unwrap(), TagRead::Blank);
    }

    #[test]
    fn test_bad_hex_is_malformed() {
        assert!(matches!(parse_line("ndef:zz"), Err(TagReadError::Malformed(_))));
    }

    #[test]
    fn test_source_yields_lines_then_closes() {
        let input = Cursor::new("room:Kitchen\n\ncommand:play\n");
        let mut source = LineTagSource::from_reader(input, "test").unwrap();
        let timeout = Duration::from_secs(2);

        assert_eq!(texts(source.poll(timeout).unwrap()), vec!["room:Kitchen"]);
        assert_eq!(source.poll(timeout).unwrap(), TagRead::Blank);
        assert_eq!(texts(source.poll(timeout).unwrap()), vec!["command:play"]);
        assert!(matches!(source.poll(timeout), Err(TagReadError::Closed)));
    }

    #[test]
    fn test_missing_device_is_init_error() {
        let err = LineTagSource::open(Path::new("/nonexistent/nfc0")).unwrap_err();
        assert!(matches!(err, ReaderInitError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/nfc0"));
    }

    #[test]
    fn test_fifo_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags");
        std::fs::write(&path, "tunein/play/34682\n").unwrap();

        let mut source = LineTagSource::open(&path).unwrap();
        assert_eq!(
            texts(source.poll(Duration::from_secs(2)).unwrap()),
            vec!["tunein/play/34682"]
        );
    }
}
