//! TLS protocol constants and types.

use crate::error::{Error, Result};

/// TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// TLS 1.0 (RFC 2246) - Legacy, not recommended
    Tls10 = 0x0301,

    /// TLS 1.1 (RFC 4346) - Legacy, not recommended
    Tls11 = 0x0302,

    /// TLS 1.2 (RFC 5246)
    Tls12 = 0x0303,

    /// TLS 1.3 (RFC 8446) - Recommended
    Tls13 = 0x0304,
}

impl ProtocolVersion {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0301 => Some(ProtocolVersion::Tls10),
            0x0302 => Some(ProtocolVersion::Tls11),
            0x0303 => Some(ProtocolVersion::Tls12),
            0x0304 => Some(ProtocolVersion::Tls13),
            _ => None,
        }
    }

    /// Parse a wire version, failing with [`Error::UnsupportedVersion`].
    ///
    /// SSL 3.0 (0x0300) and anything unknown is rejected here.
    pub fn try_from_u16(value: u16) -> Result<Self> {
        Self::from_u16(value).ok_or(Error::UnsupportedVersion(value))
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// The version bytes written into record headers for this version.
    ///
    /// TLS 1.3 always puts 0x0303 on the wire for middlebox compatibility
    /// (RFC 8446 Section 5.1); the true version is established by the
    /// handshake.
    pub const fn wire_version(self) -> ProtocolVersion {
        match self {
            ProtocolVersion::Tls13 => ProtocolVersion::Tls12,
            v => v,
        }
    }

    /// Get the protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Tls10 => "TLS 1.0",
            ProtocolVersion::Tls11 => "TLS 1.1",
            ProtocolVersion::Tls12 => "TLS 1.2",
            ProtocolVersion::Tls13 => "TLS 1.3",
        }
    }

    /// Check if this version is considered secure.
    ///
    /// TLS 1.0 and 1.1 are no longer considered secure.
    pub const fn is_secure(self) -> bool {
        !matches!(self, ProtocolVersion::Tls10 | ProtocolVersion::Tls11)
    }
}

/// TLS content type (RFC 8446 Section 5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    /// Change cipher spec (20) - Legacy TLS 1.2
    ChangeCipherSpec = 20,

    /// Alert (21)
    Alert = 21,

    /// Handshake (22)
    Handshake = 22,

    /// Application data (23)
    ApplicationData = 23,

    /// Heartbeat (24) - RFC 6520
    Heartbeat = 24,
}

impl ContentType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            20 => Some(ContentType::ChangeCipherSpec),
            21 => Some(ContentType::Alert),
            22 => Some(ContentType::Handshake),
            23 => Some(ContentType::ApplicationData),
            24 => Some(ContentType::Heartbeat),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Check if this content type is valid inside a TLS 1.3 protected record.
    pub const fn is_valid_for_tls13(self) -> bool {
        matches!(
            self,
            ContentType::Alert | ContentType::Handshake | ContentType::ApplicationData
        )
    }
}
