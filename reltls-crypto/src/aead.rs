//! AEAD (Authenticated Encryption with Associated Data) cipher interface.

use crate::Result;

/// AEAD cipher algorithms supported by reltls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// AES-128-GCM (TLS 1.3 mandatory cipher)
    Aes128Gcm,
    /// AES-256-GCM
    Aes256Gcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
    /// AES-128-CCM (TLS 1.3 optional, for constrained devices)
    Aes128Ccm,
    /// AES-128-CCM-8 (TLS 1.3 optional, 8-byte tag, for IoT)
    Aes128Ccm8,
}

impl AeadAlgorithm {
    /// Get the key size in bytes for this algorithm.
    pub const fn key_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128Gcm => 16,
            AeadAlgorithm::Aes256Gcm => 32,
            AeadAlgorithm::ChaCha20Poly1305 => 32,
            AeadAlgorithm::Aes128Ccm => 16,
            AeadAlgorithm::Aes128Ccm8 => 16,
        }
    }

    /// Get the nonce size in bytes for this algorithm.
    ///
    /// All TLS AEAD ciphers use 96-bit nonces.
    pub const fn nonce_size(self) -> usize {
        12
    }

    /// Get the authentication tag size in bytes for this algorithm.
    pub const fn tag_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128Gcm
            | AeadAlgorithm::Aes256Gcm
            | AeadAlgorithm::ChaCha20Poly1305
            | AeadAlgorithm::Aes128Ccm => 16,
            AeadAlgorithm::Aes128Ccm8 => 8,
        }
    }

    /// Get the name of this algorithm as used in TLS cipher suite names.
    pub const fn name(self) -> &'static str {
        match self {
            AeadAlgorithm::Aes128Gcm => "AES_128_GCM",
            AeadAlgorithm::Aes256Gcm => "AES_256_GCM",
            AeadAlgorithm::ChaCha20Poly1305 => "CHACHA20_POLY1305",
            AeadAlgorithm::Aes128Ccm => "AES_128_CCM",
            AeadAlgorithm::Aes128Ccm8 => "AES_128_CCM_8",
        }
    }
}

/// AEAD cipher trait.
///
/// AEAD ciphers provide authenticated encryption with associated data. They
/// are used exclusively in TLS 1.3 and by the GCM/CCM/ChaCha20-Poly1305
/// cipher suites of TLS 1.2.
///
/// # Security Requirements
///
/// - Tag verification MUST be constant-time
/// - Nonces MUST NOT be reused with the same key
pub trait Aead: Send + Sync {
    /// Encrypt and authenticate plaintext.
    ///
    /// # Arguments
    ///
    /// * `key` - Encryption key (size must match algorithm)
    /// * `nonce` - Nonce/IV (size must match algorithm, MUST be unique per encryption)
    /// * `aad` - Additional authenticated data (can be empty)
    /// * `plaintext` - Data to encrypt
    ///
    /// # Returns
    ///
    /// Ciphertext with the authentication tag appended.
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt and verify ciphertext.
    ///
    /// `ciphertext` carries the authentication tag in its trailing
    /// `tag_size()` bytes. Tag verification is constant-time; on mismatch the
    /// provider returns [`crate::Error::AuthenticationFailed`] and no
    /// plaintext.
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Get the algorithm this cipher implements.
    fn algorithm(&self) -> AeadAlgorithm;

    /// Get the key size in bytes.
    fn key_size(&self) -> usize {
        self.algorithm().key_size()
    }

    /// Get the nonce size in bytes.
    fn nonce_size(&self) -> usize {
        self.algorithm().nonce_size()
    }

    /// Get the authentication tag size in bytes.
    fn tag_size(&self) -> usize {
        self.algorithm().tag_size()
    }
}
