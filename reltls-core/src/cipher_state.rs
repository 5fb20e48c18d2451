//! Per-direction cipher state: key material and the record sequence number.

use core::fmt;

use zeroize::Zeroizing;

use crate::cipher::CipherSuite;
use crate::error::{Error, Result};
use crate::protocol::ProtocolVersion;

/// Cipher state for one direction (read or write) of a connection.
///
/// The key material is immutable after construction; the only mutable field
/// is the 64-bit record sequence number, which starts at 0 and increases by
/// exactly one per protected record. Each direction owns its own state, so
/// no interior mutability is needed.
pub struct CipherState {
    /// Cipher suite in use
    cipher_suite: CipherSuite,

    /// Negotiated protocol version
    tls_version: ProtocolVersion,

    /// Bulk cipher key
    key: Zeroizing<Vec<u8>>,

    /// AEAD IV (12 bytes) or CBC IV (one cipher block)
    iv: Zeroizing<Vec<u8>>,

    /// MAC key for MAC-then-encrypt suites (empty for AEAD suites)
    mac_key: Zeroizing<Vec<u8>>,

    /// Sequence number (incremented per record)
    sequence_number: u64,
}

impl CipherState {
    /// Create a new cipher state from derived key material.
    ///
    /// Key derivation itself happens above the record layer; this
    /// constructor only validates that the material fits the suite.
    pub fn new(
        cipher_suite: CipherSuite,
        tls_version: ProtocolVersion,
        key: Vec<u8>,
        iv: Vec<u8>,
        mac_key: Vec<u8>,
    ) -> Result<Self> {
        if key.len() != cipher_suite.key_length() {
            return Err(Error::InvalidParameter(format!(
                "key length {} does not match suite {} (expected {})",
                key.len(),
                cipher_suite.name(),
                cipher_suite.key_length()
            )));
        }
        if iv.len() != cipher_suite.iv_length() {
            return Err(Error::InvalidParameter(format!(
                "IV length {} does not match suite {} (expected {})",
                iv.len(),
                cipher_suite.name(),
                cipher_suite.iv_length()
            )));
        }
        if !cipher_suite.is_aead() && mac_key.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "suite {} requires a MAC key",
                cipher_suite.name()
            )));
        }

        Ok(Self {
            cipher_suite,
            tls_version,
            key: Zeroizing::new(key),
            iv: Zeroizing::new(iv),
            mac_key: Zeroizing::new(mac_key),
            sequence_number: 0,
        })
    }

    /// Get the cipher suite.
    pub fn cipher_suite(&self) -> CipherSuite {
        self.cipher_suite
    }

    /// Get the negotiated protocol version.
    pub fn tls_version(&self) -> ProtocolVersion {
        self.tls_version
    }

    /// Get the bulk cipher key.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Get the IV.
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Get the MAC key (empty for AEAD suites).
    pub fn mac_key(&self) -> &[u8] {
        &self.mac_key
    }

    /// Get the current sequence number without consuming it.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Return the current sequence number and advance the counter.
    ///
    /// This is the only mutator on the state. The counter never wraps: once
    /// the 64-bit space is exhausted the record is refused with
    /// [`Error::SequenceExhausted`] and the connection must be rekeyed or
    /// closed.
    pub fn next_sequence_number(&mut self) -> Result<u64> {
        let seq = self.sequence_number;
        self.sequence_number = seq.checked_add(1).ok_or(Error::SequenceExhausted)?;
        Ok(seq)
    }
}

// Manual impl so key material never reaches logs.
impl fmt::Debug for CipherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherState")
            .field("cipher_suite", &self.cipher_suite.name())
            .field("tls_version", &self.tls_version.name())
            .field("sequence_number", &self.sequence_number)
            .finish_non_exhaustive()
    }
}

/// Compute the per-record AEAD nonce.
///
/// Per RFC 8446 Section 5.3 (and the equivalent TLS 1.2 implicit-nonce
/// construction): the 64-bit big-endian sequence number is zero-extended on
/// the left to the IV length and XORed with the IV.
pub(crate) fn nonce_for_sequence(iv: &[u8], sequence_number: u64) -> Vec<u8> {
    let mut nonce = iv.to_vec();
    let seq_bytes = sequence_number.to_be_bytes();
    let offset = nonce.len().saturating_sub(seq_bytes.len());
    for (i, &byte) in seq_bytes.iter().enumerate() {
        nonce[offset + i] ^= byte;
    }
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aead_state() -> CipherState {
        CipherState::new(
            CipherSuite::Aes128GcmSha256,
            ProtocolVersion::Tls13,
            vec![0u8; 16],
            vec![0u8; 12],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_sequence_get_and_increment() {
        let mut state = aead_state();
        assert_eq!(state.sequence_number(), 0);
        assert_eq!(state.next_sequence_number().unwrap(), 0);
        assert_eq!(state.next_sequence_number().unwrap(), 1);
        assert_eq!(state.sequence_number(), 2);
    }

    #[test]
    fn test_sequence_exhaustion_refused() {
        let mut state = aead_state();
        state.sequence_number = u64::MAX;
        assert_eq!(state.next_sequence_number(), Err(Error::SequenceExhausted));
        // Counter is not reset by the failure.
        assert_eq!(state.sequence_number(), u64::MAX);
    }

    #[test]
    fn test_key_length_validated() {
        let result = CipherState::new(
            CipherSuite::Aes256GcmSha384,
            ProtocolVersion::Tls13,
            vec![0u8; 16], // needs 32
            vec![0u8; 12],
            Vec::new(),
        );
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_cbc_suite_requires_mac_key() {
        let result = CipherState::new(
            CipherSuite::RsaWithAes128CbcSha,
            ProtocolVersion::Tls12,
            vec![0u8; 16],
            vec![0u8; 16],
            Vec::new(),
        );
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_nonce_zero_extends_sequence() {
        let iv = [0u8; 12];
        // Sequence 1 must flip only the last byte: the 64-bit counter is
        // left-padded with zeros, never cycled across the IV.
        let nonce = nonce_for_sequence(&iv, 1);
        assert_eq!(&nonce[..11], &[0u8; 11]);
        assert_eq!(nonce[11], 1);

        let nonce = nonce_for_sequence(&iv, 0x0102_0304_0506_0708);
        assert_eq!(&nonce[..4], &[0u8; 4]);
        assert_eq!(&nonce[4..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_nonce_xors_with_iv() {
        let iv = [0xFFu8; 12];
        let nonce = nonce_for_sequence(&iv, 1);
        assert_eq!(nonce[11], 0xFE);
        assert_eq!(&nonce[..11], &[0xFFu8; 11]);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let state = aead_state();
        let rendered = format!("{:?}", state);
        assert!(!rendered.contains("key:"));
        assert!(rendered.contains("TLS_AES_128_GCM_SHA256"));
    }
}
