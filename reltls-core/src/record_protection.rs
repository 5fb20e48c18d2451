//! TLS 1.3 record protection (RFC 8446 Section 5.2).
//!
//! TLS 1.3 protects every record with an AEAD cipher. The construction:
//!
//! - Plaintext fed to the AEAD is `TLSInnerPlaintext`: the fragment, then a
//!   single byte carrying the true content type, then optional zero padding
//!   (none is emitted here; received padding is stripped).
//! - Additional data is the outer record header: `application_data (23) ||
//!   0x0303 || length`, where length counts ciphertext plus tag.
//! - The nonce XORs the static IV with the zero-extended 64-bit sequence
//!   number (RFC 8446 Section 5.3).
//! - On the wire the outer content type is always `application_data` and the
//!   outer version is always 0x0303.

use reltls_crypto::CryptoProvider;

use crate::cipher_state::{nonce_for_sequence, CipherState};
use crate::error::{Error, Result};
use crate::protocol::{ContentType, ProtocolVersion};
use crate::record::TlsRecord;

/// TLS 1.3 record protection transform.
///
/// Stateless: key material and the sequence counter live in the
/// per-direction [`CipherState`] passed into each call.
#[derive(Debug, Default)]
pub struct Tls13RecordProtection;

impl Tls13RecordProtection {
    /// Encrypt one fragment into a protected record.
    ///
    /// Consumes one sequence number from `state`. The returned record
    /// carries the TLS 1.3 outer header (`application_data`, version
    /// 0x0303) and `ciphertext || tag` as its fragment.
    pub fn encrypt(
        &self,
        provider: &dyn CryptoProvider,
        state: &mut CipherState,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<TlsRecord> {
        let algorithm = state
            .cipher_suite()
            .aead_algorithm()
            .ok_or_else(|| Error::CryptoError("TLS 1.3 requires an AEAD suite".into()))?;

        // TLSInnerPlaintext = content || content_type; no padding emitted.
        let mut inner = Vec::with_capacity(fragment.len() + 1);
        inner.extend_from_slice(fragment);
        inner.push(content_type.to_u8());

        let sequence = state.next_sequence_number()?;
        let nonce = nonce_for_sequence(state.iv(), sequence);

        let aead = provider.aead(algorithm)?;
        let encrypted_length = inner.len() + aead.tag_size();
        let additional_data = build_additional_data(encrypted_length)?;

        let ciphertext = aead.seal(state.key(), &nonce, &additional_data, &inner)?;

        Ok(TlsRecord::new(
            ContentType::ApplicationData,
            ProtocolVersion::Tls12,
            ciphertext,
        ))
    }

    /// Decrypt a protected record, recovering the plaintext and the inner
    /// content type.
    ///
    /// Consumes one sequence number from `state` whether or not the record
    /// verifies. Any AEAD rejection surfaces as the opaque
    /// [`Error::RecordVerificationFailed`].
    pub fn decrypt(
        &self,
        provider: &dyn CryptoProvider,
        state: &mut CipherState,
        record: &TlsRecord,
    ) -> Result<(Vec<u8>, ContentType)> {
        let algorithm = state
            .cipher_suite()
            .aead_algorithm()
            .ok_or_else(|| Error::CryptoError("TLS 1.3 requires an AEAD suite".into()))?;

        let sequence = state.next_sequence_number()?;
        let nonce = nonce_for_sequence(state.iv(), sequence);
        let additional_data = build_additional_data(record.fragment.len())?;

        let aead = provider.aead(algorithm)?;
        let buffer = aead
            .open(state.key(), &nonce, &additional_data, &record.fragment)
            .map_err(|cause| {
                tracing::debug!(sequence, %cause, "record rejected by AEAD");
                Error::RecordVerificationFailed
            })?;

        // Strip zero padding; the last non-zero byte is the content type.
        let mut content_type_pos = buffer.len();
        while content_type_pos > 0 && buffer[content_type_pos - 1] == 0 {
            content_type_pos -= 1;
        }
        if content_type_pos == 0 {
            return Err(Error::EmptyPlaintext);
        }

        let content_type_byte = buffer[content_type_pos - 1];
        let content_type = ContentType::from_u8(content_type_byte).ok_or_else(|| {
            Error::InvalidMessage(format!(
                "invalid inner content type 0x{:02x}",
                content_type_byte
            ))
        })?;

        Ok((buffer[..content_type_pos - 1].to_vec(), content_type))
    }
}

/// Build the AEAD additional data: the outer TLSCiphertext header.
fn build_additional_data(encrypted_length: usize) -> Result<Vec<u8>> {
    if encrypted_length > u16::MAX as usize {
        return Err(Error::RecordOverflow);
    }
    let mut ad = Vec::with_capacity(5);
    ad.push(ContentType::ApplicationData.to_u8());
    ad.extend_from_slice(&ProtocolVersion::Tls12.to_u16().to_be_bytes());
    ad.extend_from_slice(&(encrypted_length as u16).to_be_bytes());
    Ok(ad)
}
