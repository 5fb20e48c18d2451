//! Error types for the record layer.

use core::fmt;

/// Result type for record-layer operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur in the record layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Unknown or unsupported TLS version (e.g. SSL 3.0).
    UnsupportedVersion(u16),

    /// A configuration parameter is out of its valid range.
    InvalidParameter(String),

    /// Decode failed because the input is shorter than the framed record.
    ///
    /// Internal to the receive loop; it triggers another transport read
    /// rather than surfacing to the caller.
    IncompleteRecord,

    /// The transport returned no data; the peer closed or timed out.
    TransportClosed,

    /// The transport wrote fewer bytes than offered.
    IncompleteSend {
        /// Bytes the transport reported written
        written: usize,
        /// Bytes offered for sending
        expected: usize,
    },

    /// A record's length field exceeds the protocol maximum, or the
    /// receive buffer would grow past its cap.
    RecordOverflow,

    /// Record protection rejected the record.
    ///
    /// AEAD tag failure, MAC mismatch, and bad padding all collapse into
    /// this one variant so callers (and peers) cannot distinguish them.
    RecordVerificationFailed,

    /// The replay window rejected this sequence number.
    ReplayDetected(u64),

    /// A TLS 1.3 record decrypted to nothing, not even an inner content type.
    EmptyPlaintext,

    /// The 64-bit sequence counter is exhausted; the connection must be
    /// rekeyed or closed.
    SequenceExhausted,

    /// Invalid message format (bad content type, bad version byte, ...).
    InvalidMessage(String),

    /// I/O error from the underlying transport.
    IoError(String),

    /// Cryptographic provider error outside the verification path.
    CryptoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedVersion(v) => write!(f, "Unsupported TLS version: 0x{:04x}", v),
            Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Error::IncompleteRecord => write!(f, "Incomplete record"),
            Error::TransportClosed => write!(f, "Transport closed"),
            Error::IncompleteSend { written, expected } => {
                write!(f, "Incomplete send: wrote {} of {} bytes", written, expected)
            },
            Error::RecordOverflow => write!(f, "Record overflow"),
            Error::RecordVerificationFailed => write!(f, "Record verification failed"),
            Error::ReplayDetected(seq) => write!(f, "Replay detected: sequence {}", seq),
            Error::EmptyPlaintext => write!(f, "Decrypted record carries no content type"),
            Error::SequenceExhausted => write!(f, "Sequence number space exhausted"),
            Error::InvalidMessage(msg) => write!(f, "Invalid message: {}", msg),
            Error::IoError(msg) => write!(f, "I/O error: {}", msg),
            Error::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<reltls_crypto::Error> for Error {
    fn from(e: reltls_crypto::Error) -> Self {
        Error::CryptoError(format!("{}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_generic_for_verification_failure() {
        // The rendered message must not reveal whether padding or MAC failed.
        let msg = format!("{}", Error::RecordVerificationFailed);
        assert_eq!(msg, "Record verification failed");
    }

    #[test]
    fn test_crypto_error_conversion() {
        let e: Error = reltls_crypto::Error::InvalidLength.into();
        assert!(matches!(e, Error::CryptoError(_)));
    }
}
