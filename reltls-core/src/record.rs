//! TLS record framing.
//!
//! Every record on the wire carries a 5-byte header:
//!
//! ```text
//! struct {
//!     ContentType type;           /* 1 byte  */
//!     ProtocolVersion version;    /* 2 bytes */
//!     uint16 length;              /* 2 bytes, big-endian */
//!     opaque fragment[length];
//! } TLSRecord;
//! ```
//!
//! Plaintext fragments are capped at 2^14 bytes; protected fragments may
//! carry up to 256 bytes of expansion (tag, inner content type).

use bytes::{Buf, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::{ContentType, ProtocolVersion};

/// TLS record header size (5 bytes).
pub const RECORD_HEADER_SIZE: usize = 5;

/// Maximum plaintext fragment size (2^14).
pub const MAX_FRAGMENT_SIZE: usize = 16384;

/// Maximum protected fragment size (2^14 plus AEAD/MAC expansion).
pub const MAX_CIPHERTEXT_SIZE: usize = MAX_FRAGMENT_SIZE + 256;

/// Smallest configurable maximum fragment length.
pub const MIN_FRAGMENT_LENGTH: usize = 64;

/// A single TLS record: content type, version, and fragment.
///
/// Used for both plaintext records and protected records (where the
/// fragment is ciphertext plus tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsRecord {
    /// Content type
    pub content_type: ContentType,

    /// Protocol version as seen on the wire (legacy field in TLS 1.3)
    pub version: ProtocolVersion,

    /// Fragment data
    pub fragment: Vec<u8>,
}

impl TlsRecord {
    /// Create a new record.
    pub fn new(content_type: ContentType, version: ProtocolVersion, fragment: Vec<u8>) -> Self {
        Self {
            content_type,
            version,
            fragment,
        }
    }

    /// Get the encoded record length (including header).
    pub fn len(&self) -> usize {
        RECORD_HEADER_SIZE + self.fragment.len()
    }

    /// Check if the fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty()
    }

    /// Encode the record to wire format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.fragment.len() > MAX_CIPHERTEXT_SIZE {
            return Err(Error::RecordOverflow);
        }

        let mut buf = Vec::with_capacity(self.len());
        buf.push(self.content_type.to_u8());
        buf.extend_from_slice(&self.version.to_u16().to_be_bytes());
        buf.extend_from_slice(&(self.fragment.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.fragment);
        Ok(buf)
    }

    /// Decode a record from wire format.
    ///
    /// Short input is [`Error::IncompleteRecord`] (the receive loop reads
    /// more and retries); malformed header bytes and oversized length
    /// fields are hard errors.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::IncompleteRecord);
        }

        let content_type = ContentType::from_u8(data[0])
            .ok_or_else(|| Error::InvalidMessage(format!("unknown content type {}", data[0])))?;

        let version_raw = u16::from_be_bytes([data[1], data[2]]);
        let version = ProtocolVersion::from_u16(version_raw).ok_or_else(|| {
            Error::InvalidMessage(format!("unknown record version 0x{:04x}", version_raw))
        })?;

        let length = u16::from_be_bytes([data[3], data[4]]) as usize;
        if length > MAX_CIPHERTEXT_SIZE {
            return Err(Error::RecordOverflow);
        }
        if data.len() < RECORD_HEADER_SIZE + length {
            return Err(Error::IncompleteRecord);
        }

        let fragment = data[RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + length].to_vec();
        Ok(Self {
            content_type,
            version,
            fragment,
        })
    }
}

/// Try to parse one complete record from the front of `buffer`.
///
/// Returns `Ok(None)` when the buffer holds only a partial record (more
/// transport reads needed). On success the record's bytes are consumed from
/// the buffer. Malformed headers propagate as errors with the buffer left
/// untouched; the caller decides how much state to discard.
pub(crate) fn parse_record(buffer: &mut BytesMut) -> Result<Option<TlsRecord>> {
    if buffer.len() < RECORD_HEADER_SIZE {
        return Ok(None);
    }

    let length = u16::from_be_bytes([buffer[3], buffer[4]]) as usize;
    if length > MAX_CIPHERTEXT_SIZE {
        return Err(Error::RecordOverflow);
    }
    if buffer.len() < RECORD_HEADER_SIZE + length {
        return Ok(None);
    }

    let record = TlsRecord::decode(&buffer[..RECORD_HEADER_SIZE + length])?;
    buffer.advance(RECORD_HEADER_SIZE + length);
    Ok(Some(record))
}
