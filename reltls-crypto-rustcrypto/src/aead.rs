//! AEAD cipher implementations backed by the RustCrypto AEAD crates.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead as _, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use ccm::consts::{U12, U16, U8};
use ccm::Ccm;
use chacha20poly1305::ChaCha20Poly1305;
use reltls_crypto::{Aead, AeadAlgorithm, Error, Result};

type Aes128Ccm = Ccm<aes::Aes128, U16, U12>;
type Aes128Ccm8 = Ccm<aes::Aes128, U8, U12>;

/// Create an AEAD cipher instance for the specified algorithm.
pub(crate) fn create_aead(algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
    Ok(Box::new(RustCryptoAead { algorithm }))
}

/// One wrapper serves every algorithm; dispatch happens per call so the
/// wrapper itself stays keyless and `Sync`.
struct RustCryptoAead {
    algorithm: AeadAlgorithm,
}

impl RustCryptoAead {
    fn check_sizes(&self, key: &[u8], nonce: &[u8]) -> Result<()> {
        if key.len() != self.algorithm.key_size() {
            return Err(Error::InvalidKeySize {
                expected: self.algorithm.key_size(),
                actual: key.len(),
            });
        }
        if nonce.len() != self.algorithm.nonce_size() {
            return Err(Error::InvalidNonceSize {
                expected: self.algorithm.nonce_size(),
                actual: nonce.len(),
            });
        }
        Ok(())
    }
}

macro_rules! dispatch_seal {
    ($cipher:ty, $key:expr, $nonce:expr, $aad:expr, $plaintext:expr) => {{
        let cipher = <$cipher>::new_from_slice($key)
            .map_err(|_| Error::Internal("AEAD key rejected".into()))?;
        cipher
            .encrypt(
                GenericArray::from_slice($nonce),
                Payload {
                    msg: $plaintext,
                    aad: $aad,
                },
            )
            .map_err(|_| Error::Internal("AEAD encryption failed".into()))
    }};
}

macro_rules! dispatch_open {
    ($cipher:ty, $key:expr, $nonce:expr, $aad:expr, $ciphertext:expr) => {{
        let cipher = <$cipher>::new_from_slice($key)
            .map_err(|_| Error::Internal("AEAD key rejected".into()))?;
        cipher
            .decrypt(
                GenericArray::from_slice($nonce),
                Payload {
                    msg: $ciphertext,
                    aad: $aad,
                },
            )
            .map_err(|_| Error::AuthenticationFailed)
    }};
}

impl Aead for RustCryptoAead {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, nonce)?;
        match self.algorithm {
            AeadAlgorithm::Aes128Gcm => dispatch_seal!(Aes128Gcm, key, nonce, aad, plaintext),
            AeadAlgorithm::Aes256Gcm => dispatch_seal!(Aes256Gcm, key, nonce, aad, plaintext),
            AeadAlgorithm::ChaCha20Poly1305 => {
                dispatch_seal!(ChaCha20Poly1305, key, nonce, aad, plaintext)
            },
            AeadAlgorithm::Aes128Ccm => dispatch_seal!(Aes128Ccm, key, nonce, aad, plaintext),
            AeadAlgorithm::Aes128Ccm8 => dispatch_seal!(Aes128Ccm8, key, nonce, aad, plaintext),
        }
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, nonce)?;
        if ciphertext.len() < self.algorithm.tag_size() {
            return Err(Error::AuthenticationFailed);
        }
        match self.algorithm {
            AeadAlgorithm::Aes128Gcm => dispatch_open!(Aes128Gcm, key, nonce, aad, ciphertext),
            AeadAlgorithm::Aes256Gcm => dispatch_open!(Aes256Gcm, key, nonce, aad, ciphertext),
            AeadAlgorithm::ChaCha20Poly1305 => {
                dispatch_open!(ChaCha20Poly1305, key, nonce, aad, ciphertext)
            },
            AeadAlgorithm::Aes128Ccm => dispatch_open!(Aes128Ccm, key, nonce, aad, ciphertext),
            AeadAlgorithm::Aes128Ccm8 => dispatch_open!(Aes128Ccm8, key, nonce, aad, ciphertext),
        }
    }

    fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }
}
