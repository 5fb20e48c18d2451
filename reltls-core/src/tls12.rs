//! TLS 1.2 record protection (RFC 5246 Section 6.2.3).
//!
//! Two constructions, selected by the cipher suite:
//!
//! - **AEAD** (GCM, CCM, ChaCha20-Poly1305): the 12-byte write IV is XORed
//!   with the zero-extended sequence number to form the nonce, and the
//!   13-byte `seq_num || type || version || length` header is authenticated
//!   as additional data. Integrity comes entirely from the AEAD tag.
//! - **MAC-then-encrypt** (CBC suites): an HMAC over the same 13-byte header
//!   plus the plaintext is appended, the result is PKCS#7-padded to the
//!   cipher block size and CBC-encrypted.
//!
//! Unlike TLS 1.3 there is no inner content type: the outer content type on
//! the wire is the real one, and decryption returns it unchanged.
//!
//! The CBC decrypt path is shaped against Lucky-13-class oracles: padding is
//! verified in constant time, the MAC pass hashes the same number of bytes
//! whatever the padding claims, and padding and MAC failures collapse into
//! one opaque error.

use reltls_crypto::CryptoProvider;

use crate::cipher_state::{nonce_for_sequence, CipherState};
use crate::error::{Error, Result};
use crate::padding::{apply_pkcs7_padding, combine_validity, verify_pkcs7_padding_constant_time};
use crate::protocol::{ContentType, ProtocolVersion};
use crate::record::TlsRecord;

/// TLS 1.2 record protection transform.
///
/// Stateless: key material and the sequence counter live in the
/// per-direction [`CipherState`] passed into each call.
#[derive(Debug, Default)]
pub struct Tls12RecordProtection;

impl Tls12RecordProtection {
    /// Encrypt one fragment into a protected record.
    ///
    /// Consumes one sequence number from `state`. The outer content type is
    /// preserved; the record version is the negotiated wire version.
    pub fn encrypt(
        &self,
        provider: &dyn CryptoProvider,
        state: &mut CipherState,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<TlsRecord> {
        let version = state.tls_version().wire_version();
        let sequence = state.next_sequence_number()?;

        let fragment = if let Some(algorithm) = state.cipher_suite().aead_algorithm() {
            let nonce = nonce_for_sequence(state.iv(), sequence);
            let additional_data =
                record_mac_header(sequence, content_type, version, fragment.len() as u16);
            let aead = provider.aead(algorithm)?;
            aead.seal(state.key(), &nonce, &additional_data, fragment)?
        } else {
            self.encrypt_cbc(provider, state, sequence, content_type, version, fragment)?
        };

        Ok(TlsRecord::new(content_type, version, fragment))
    }

    /// Decrypt a protected record.
    ///
    /// Consumes one sequence number from `state` whether or not the record
    /// verifies. Returns the plaintext together with the outer content type
    /// seen on the wire (TLS 1.2 has no inner-type tagging). AEAD tag
    /// failures, MAC mismatches, and bad padding all surface as the opaque
    /// [`Error::RecordVerificationFailed`].
    pub fn decrypt(
        &self,
        provider: &dyn CryptoProvider,
        state: &mut CipherState,
        record: &TlsRecord,
    ) -> Result<(Vec<u8>, ContentType)> {
        let sequence = state.next_sequence_number()?;

        let plaintext = if let Some(algorithm) = state.cipher_suite().aead_algorithm() {
            let aead = provider.aead(algorithm)?;
            let tag_size = aead.tag_size();
            if record.fragment.len() < tag_size {
                tracing::debug!(sequence, "protected record shorter than AEAD tag");
                return Err(Error::RecordVerificationFailed);
            }
            let plaintext_length = record.fragment.len() - tag_size;
            let nonce = nonce_for_sequence(state.iv(), sequence);
            let additional_data = record_mac_header(
                sequence,
                record.content_type,
                record.version,
                plaintext_length as u16,
            );
            aead.open(state.key(), &nonce, &additional_data, &record.fragment)
                .map_err(|cause| {
                    tracing::debug!(sequence, %cause, "record rejected by AEAD");
                    Error::RecordVerificationFailed
                })?
        } else {
            self.decrypt_cbc(provider, state, sequence, record)?
        };

        Ok((plaintext, record.content_type))
    }

    fn encrypt_cbc(
        &self,
        provider: &dyn CryptoProvider,
        state: &CipherState,
        sequence: u64,
        content_type: ContentType,
        version: ProtocolVersion,
        fragment: &[u8],
    ) -> Result<Vec<u8>> {
        let suite = state.cipher_suite();
        let mac_algorithm = suite
            .mac_algorithm()
            .ok_or_else(|| Error::CryptoError("CBC suite without MAC algorithm".into()))?;
        let cbc_algorithm = suite
            .cbc_algorithm()
            .ok_or_else(|| Error::CryptoError("suite has no bulk cipher".into()))?;

        // MAC over seq_num || type || version || length || plaintext.
        let mut mac = provider.hmac(mac_algorithm, state.mac_key())?;
        mac.update(&record_mac_header(
            sequence,
            content_type,
            version,
            fragment.len() as u16,
        ));
        mac.update(fragment);
        let tag = mac.finalize();

        let mut plaintext = Vec::with_capacity(fragment.len() + tag.len());
        plaintext.extend_from_slice(fragment);
        plaintext.extend_from_slice(&tag);

        let padded = apply_pkcs7_padding(&plaintext, cbc_algorithm.block_size())?;
        let cipher = provider.block_cipher(cbc_algorithm)?;
        Ok(cipher.encrypt(state.key(), state.iv(), &padded)?)
    }

    fn decrypt_cbc(
        &self,
        provider: &dyn CryptoProvider,
        state: &CipherState,
        sequence: u64,
        record: &TlsRecord,
    ) -> Result<Vec<u8>> {
        let suite = state.cipher_suite();
        let mac_algorithm = suite
            .mac_algorithm()
            .ok_or_else(|| Error::CryptoError("CBC suite without MAC algorithm".into()))?;
        let cbc_algorithm = suite
            .cbc_algorithm()
            .ok_or_else(|| Error::CryptoError("suite has no bulk cipher".into()))?;
        let block_size = cbc_algorithm.block_size();

        // Length-shape problems are public information; no oracle to hide.
        if record.fragment.is_empty() || record.fragment.len() % block_size != 0 {
            tracing::debug!(sequence, "CBC record is not a whole number of blocks");
            return Err(Error::RecordVerificationFailed);
        }

        let cipher = provider.block_cipher(cbc_algorithm)?;
        let decrypted = cipher.decrypt(state.key(), state.iv(), &record.fragment)?;

        // Reference length: the longest content this record could carry
        // (zero bytes of padding). A record too short to hold its MAC at
        // all is a public length-shape failure.
        let mac_len = mac_algorithm.output_size();
        let reference_len = match decrypted.len().checked_sub(mac_len) {
            Some(n) => n,
            None => {
                tracing::debug!(sequence, "CBC record shorter than its MAC");
                return Err(Error::RecordVerificationFailed);
            },
        };

        let (padding_valid, pad_len) =
            verify_pkcs7_padding_constant_time(&decrypted, block_size);

        // Best-effort split into content || mac || padding. pad_len is 0
        // when the padding is malformed.
        let unpadded_len = decrypted.len() - pad_len;
        let (content_len, structure_valid) = match unpadded_len.checked_sub(mac_len) {
            Some(n) => (n, true),
            None => (0, false),
        };

        let content = &decrypted[..content_len];
        let received_mac = &decrypted[content_len..content_len + mac_len];

        let mut mac = provider.hmac(mac_algorithm, state.mac_key())?;
        mac.update(&record_mac_header(
            sequence,
            record.content_type,
            record.version,
            content_len as u16,
        ));
        mac.update(content);
        // Hash the remaining fragment bytes through a second keyed MAC so
        // every record costs exactly reference_len bytes of MAC input,
        // whatever length the padding claimed.
        let mut filler = provider.hmac(mac_algorithm, state.mac_key())?;
        filler.update(&decrypted[content_len..reference_len]);
        let _ = filler.finalize();
        let mac_valid = mac.verify(received_mac);

        let valid = combine_validity(padding_valid && structure_valid, mac_valid);
        if !valid {
            tracing::debug!(sequence, "CBC record failed padding/MAC verification");
            return Err(Error::RecordVerificationFailed);
        }

        Ok(content.to_vec())
    }
}

/// Build the 13-byte `seq_num || type || version || length` header used as
/// AEAD additional data and as the MAC prefix.
fn record_mac_header(
    sequence: u64,
    content_type: ContentType,
    version: ProtocolVersion,
    length: u16,
) -> [u8; 13] {
    let mut header = [0u8; 13];
    header[..8].copy_from_slice(&sequence.to_be_bytes());
    header[8] = content_type.to_u8();
    header[9..11].copy_from_slice(&version.to_u16().to_be_bytes());
    header[11..13].copy_from_slice(&length.to_be_bytes());
    header
}
