//! PKCS#7 padding and padding-oracle countermeasures.
//!
//! CBC cipher suites need padding applied before encryption and verified
//! after decryption. Verification runs in time independent of the padding
//! bytes themselves: the loop always examines one full cipher block and
//! folds every check into bitwise flags (`subtle::Choice`), so a forged
//! record costs the same time whether its padding is shaped well or badly.

use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater};

use crate::cipher::CipherSuite;
use crate::error::{Error, Result};
use crate::protocol::ProtocolVersion;

/// Countermeasure selected for a version/suite pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionStrategy {
    /// No record-layer countermeasure needed (AEAD or TLS 1.3).
    None,

    /// 1/n-1 record splitting against BEAST (TLS 1.0 CBC).
    SplitRecords,

    /// Constant-time padding verification against Lucky 13 / POODLE-class
    /// oracles (TLS 1.1/1.2 CBC).
    ConstantTimePadding,
}

/// Select the countermeasure for a protocol version and cipher suite.
pub fn select_protection_strategy(
    version: ProtocolVersion,
    suite: CipherSuite,
) -> ProtectionStrategy {
    if version == ProtocolVersion::Tls13 || suite.is_aead() {
        return ProtectionStrategy::None;
    }
    match version {
        ProtocolVersion::Tls10 => ProtectionStrategy::SplitRecords,
        _ => ProtectionStrategy::ConstantTimePadding,
    }
}

/// Append PKCS#7 padding: `p` bytes of value `p`, `1 <= p <= block_size`.
pub fn apply_pkcs7_padding(data: &[u8], block_size: usize) -> Result<Vec<u8>> {
    if block_size == 0 || block_size > 255 {
        return Err(Error::InvalidParameter(format!(
            "block size {} out of range",
            block_size
        )));
    }
    let pad_len = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    Ok(padded)
}

/// Verify PKCS#7 padding in constant time.
///
/// Returns `(valid, pad_len)`. The last `block_size` bytes are examined
/// unconditionally: for each offset `i` from the end, the implication
/// "`i` is a padding position => the byte equals the padding value" is
/// folded into a running flag, and the loop always runs `block_size`
/// iterations. Length-shape failures (empty input, input not a whole number
/// of blocks) depend only on public lengths and short-circuit.
///
/// On invalid padding, `pad_len` is 0 so callers have a usable best-effort
/// value for the unified MAC check.
pub fn verify_pkcs7_padding_constant_time(data: &[u8], block_size: usize) -> (bool, usize) {
    if block_size == 0 || block_size > 255 {
        return (false, 0);
    }
    if data.is_empty() || data.len() % block_size != 0 {
        return (false, 0);
    }

    let pad_value = data[data.len() - 1];

    // 1 <= pad_value <= block_size, folded without branching on the value.
    let mut valid = !pad_value.ct_eq(&0);
    valid &= !pad_value.ct_gt(&(block_size as u8));

    for i in 0..block_size {
        let byte = data[data.len() - 1 - i];
        let is_pad_position = pad_value.ct_gt(&(i as u8));
        let is_correct_value = byte.ct_eq(&pad_value);
        // is_pad_position => is_correct_value
        valid &= !is_pad_position | is_correct_value;
    }

    let valid: bool = valid.into();
    let pad_len = if valid { pad_value as usize } else { 0 };
    (valid, pad_len)
}

/// Strip PKCS#7 padding, failing on any malformed padding.
///
/// Convenience for non-secret contexts (tests, tooling). The record layer's
/// decrypt path uses [`verify_pkcs7_padding_constant_time`] directly so it
/// can fold the result into the unified MAC check.
pub fn remove_pkcs7_padding(data: &[u8], block_size: usize) -> Result<Vec<u8>> {
    let (valid, pad_len) = verify_pkcs7_padding_constant_time(data, block_size);
    if !valid {
        return Err(Error::RecordVerificationFailed);
    }
    Ok(data[..data.len() - pad_len].to_vec())
}

/// Split a plaintext into a 1-byte record and the remainder (1/n-1 split).
///
/// BEAST mitigation for TLS 1.0 CBC: the first record randomizes the CBC
/// state seen by an attacker choosing the next plaintext. Inputs shorter
/// than two bytes are returned unchanged.
pub fn apply_split_record_mitigation(plaintext: &[u8]) -> Vec<Vec<u8>> {
    if plaintext.len() < 2 {
        return vec![plaintext.to_vec()];
    }
    vec![plaintext[..1].to_vec(), plaintext[1..].to_vec()]
}

/// Fold two [`Choice`]-like booleans from different subsystems.
///
/// Used by the CBC decrypt path to combine padding validity and MAC
/// validity without a data-dependent branch in between.
pub(crate) fn combine_validity(a: bool, b: bool) -> bool {
    let combined = Choice::from(a as u8) & Choice::from(b as u8);
    combined.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_verify_roundtrip_all_block_sizes() {
        for block_size in 1..=16usize {
            for data_len in 0..=(2 * block_size) {
                let data = vec![0xA5u8; data_len];
                let padded = apply_pkcs7_padding(&data, block_size).unwrap();
                assert_eq!(padded.len() % block_size, 0);

                let expected_pad = block_size - (data_len % block_size);
                let (valid, pad_len) = verify_pkcs7_padding_constant_time(&padded, block_size);
                assert!(valid, "block_size={} data_len={}", block_size, data_len);
                assert_eq!(pad_len, expected_pad);

                let unpadded = remove_pkcs7_padding(&padded, block_size).unwrap();
                assert_eq!(unpadded, data);
            }
        }
    }

    #[test]
    fn test_full_block_of_padding_is_valid() {
        // A block-aligned input gains one whole block of padding.
        let padded = apply_pkcs7_padding(&[1, 2, 3, 4, 5, 6, 7, 8], 8).unwrap();
        assert_eq!(padded.len(), 16);
        assert_eq!(&padded[8..], &[8u8; 8]);
        let (valid, pad_len) = verify_pkcs7_padding_constant_time(&padded, 8);
        assert!(valid);
        assert_eq!(pad_len, 8);
    }

    #[test]
    fn test_corrupted_padding_rejected() {
        let mut padded = apply_pkcs7_padding(b"hello", 16).unwrap();
        let len = padded.len();
        padded[len - 3] ^= 0x40; // inside the padding run
        let (valid, pad_len) = verify_pkcs7_padding_constant_time(&padded, 16);
        assert!(!valid);
        assert_eq!(pad_len, 0);
    }

    #[test]
    fn test_zero_pad_value_rejected() {
        let mut block = vec![0u8; 16];
        block[15] = 0;
        let (valid, _) = verify_pkcs7_padding_constant_time(&block, 16);
        assert!(!valid);
    }

    #[test]
    fn test_pad_value_above_block_size_rejected() {
        let mut block = vec![17u8; 16];
        block[15] = 17;
        let (valid, _) = verify_pkcs7_padding_constant_time(&block, 16);
        assert!(!valid);
    }

    #[test]
    fn test_length_shape_failures() {
        assert_eq!(verify_pkcs7_padding_constant_time(&[], 16), (false, 0));
        assert_eq!(
            verify_pkcs7_padding_constant_time(&[1, 1, 1], 16),
            (false, 0)
        );
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            select_protection_strategy(ProtocolVersion::Tls13, CipherSuite::Aes128GcmSha256),
            ProtectionStrategy::None
        );
        assert_eq!(
            select_protection_strategy(
                ProtocolVersion::Tls12,
                CipherSuite::EcdheRsaWithAes128GcmSha256
            ),
            ProtectionStrategy::None
        );
        assert_eq!(
            select_protection_strategy(ProtocolVersion::Tls10, CipherSuite::RsaWithAes128CbcSha),
            ProtectionStrategy::SplitRecords
        );
        assert_eq!(
            select_protection_strategy(ProtocolVersion::Tls11, CipherSuite::RsaWithAes128CbcSha),
            ProtectionStrategy::ConstantTimePadding
        );
        assert_eq!(
            select_protection_strategy(
                ProtocolVersion::Tls12,
                CipherSuite::RsaWithAes256CbcSha256
            ),
            ProtectionStrategy::ConstantTimePadding
        );
    }

    #[test]
    fn test_split_record_mitigation() {
        assert_eq!(
            apply_split_record_mitigation(b"hello"),
            vec![b"h".to_vec(), b"ello".to_vec()]
        );
        assert_eq!(apply_split_record_mitigation(b"x"), vec![b"x".to_vec()]);
        assert_eq!(
            apply_split_record_mitigation(b""),
            vec![Vec::<u8>::new()]
        );
    }
}
