//! NDEF message decoding
//!
//! Only what text tags need: short and long records, optional id fields, and
//! the NFC Forum well-known text record (`TNF 0x01`, type `T`).
//!
//! ```text
//!  7   6   5   4   3   2 1 0
//! MB  ME  CF  SR  IL  TNF        header
//! TYPE LENGTH                    1 byte
//! PAYLOAD LENGTH                 1 byte (SR) or 4 bytes big-endian
//! ID LENGTH                      1 byte, only if IL
//! TYPE, ID, PAYLOAD
//! ```

use crate::error::TagReadError;

const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// Type name format of well-known NFC Forum types
pub const TNF_WELL_KNOWN: u8 = 0x01;
const TEXT_TYPE: &[u8] = b"T";

const STATUS_UTF16: u8 = 0x80;
const STATUS_LANG_MASK: u8 = 0x3f;

/// A single NDEF record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    pub tnf: u8,
    pub record_type: Vec<u8>,
    pub id: Vec<u8>,
    pub payload: Vec<u8>,
}

impl NdefRecord {
    /// A UTF-8 text record
    pub fn text_record(language: &str, text: &str) -> Self {
        let lang = &language.as_bytes()[..language.len().min(STATUS_LANG_MASK as usize)];
        let mut payload = Vec::with_capacity(1 + lang.len() + text.len());
        payload.push(lang.len() as u8);
        payload.extend_from_slice(lang);
        payload.extend_from_slice(text.as_bytes());

        Self {
            tnf: TNF_WELL_KNOWN,
            record_type: TEXT_TYPE.to_vec(),
            id: Vec::new(),
            payload,
        }
    }

    pub fn is_text(&self) -> bool {
        self.tnf == TNF_WELL_KNOWN && self.record_type == TEXT_TYPE
    }

    /// The record's text, without the language code
    pub fn text(&self) -> Result<String, TagReadError> {
        if !self.is_text() {
            return Err(TagReadError::NotText {
                tnf: self.tnf,
                record_type: String::from_utf8_lossy(&self.record_type).into_owned(),
            });
        }

        let (&status, rest) = self
            .payload
            .split_first()
            .ok_or_else(|| TagReadError::Encoding("empty text record".to_string()))?;
        let lang_len = (status & STATUS_LANG_MASK) as usize;
        let body = rest.get(lang_len..).ok_or_else(|| {
            TagReadError::Encoding(format!("language code of {} bytes overruns record", lang_len))
        })?;

        if status & STATUS_UTF16 != 0 {
            decode_utf16(body)
        } else {
            String::from_utf8(body.to_vec()).map_err(|e| TagReadError::Encoding(e.to_string()))
        }
    }
}

/// A sequence of records read from one tag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdefMessage {
    pub records: Vec<NdefRecord>,
}

impl NdefMessage {
    /// A message with one English text record
    pub fn from_text(text: &str) -> Self {
        Self {
            records: vec![NdefRecord::text_record("en", text)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode a raw NDEF message
    pub fn parse(bytes: &[u8]) -> Result<Self, TagReadError> {
        let mut cursor = Cursor { bytes, pos: 0 };
        let mut records = Vec::new();

        while !cursor.is_done() {
            let header = cursor.byte("header")?;
            if header & FLAG_CF != 0 {
                return Err(TagReadError::Chunked);
            }

            let type_len = cursor.byte("type length")? as usize;
            let payload_len = if header & FLAG_SR != 0 {
                cursor.byte("payload length")? as usize
            } else {
                let raw = cursor.take(4, "payload length")?;
                u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize
            };
            let id_len = if header & FLAG_IL != 0 {
                cursor.byte("id length")? as usize
            } else {
                0
            };

            let record_type = cursor.take(type_len, "type")?.to_vec();
            let id = cursor.take(id_len, "id")?.to_vec();
            let payload = cursor.take(payload_len, "payload")?.to_vec();

            records.push(NdefRecord {
                tnf: header & TNF_MASK,
                record_type,
                id,
                payload,
            });
        }

        Ok(Self { records })
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn is_done(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn byte(&mut self, field: &str) -> Result<u8, TagReadError> {
        Ok(self.take(1, field)?[0])
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], TagReadError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                TagReadError::Truncated(format!(
                    "{} needs {} bytes at offset {}, {} available",
                    field,
                    len,
                    self.pos,
                    self.bytes.len() - self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

/// UTF-16 text, big-endian unless a little-endian byte order mark says otherwise
fn decode_utf16(body: &[u8]) -> Result<String, TagReadError> {
    if body.len() % 2 != 0 {
        return Err(TagReadError::Encoding("odd number of UTF-16 bytes".to_string()));
    }

    let (little_endian, body) = match body {
        [0xff, 0xfe, rest @ ..] => (true, rest),
        [0xfe, 0xff, rest @ ..] => (false, rest),
        _ => (false, body),
    };

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|e| TagReadError::Encoding(e.to_string()))
}
