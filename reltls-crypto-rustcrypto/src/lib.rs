//! RustCrypto-backed implementation of the `reltls-crypto` provider traits.
//!
//! This crate wires the pure-Rust RustCrypto primitive crates (`aes-gcm`,
//! `chacha20poly1305`, `ccm`, `cbc`, `des`, `hmac`, `sha1`/`sha2`) into the
//! provider interface consumed by `reltls-core`.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

mod aead;
mod block;
mod hmac;
mod random;

use reltls_crypto::{
    Aead, AeadAlgorithm, BlockCipher, CbcAlgorithm, CryptoProvider, Hmac, MacAlgorithm, Random,
    Result,
};

/// Crypto provider backed by the RustCrypto crates.
///
/// All primitives are pure Rust; AES uses hardware intrinsics where the
/// target supports them.
#[derive(Debug, Default)]
pub struct RustCryptoProvider {
    rng: random::OsRandom,
}

impl RustCryptoProvider {
    /// Create a new provider instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
        aead::create_aead(algorithm)
    }

    fn block_cipher(&self, algorithm: CbcAlgorithm) -> Result<Box<dyn BlockCipher>> {
        block::create_block_cipher(algorithm)
    }

    fn hmac(&self, algorithm: MacAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn random(&self) -> &dyn Random {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_supports_all_tls13_aeads() {
        let provider = RustCryptoProvider::new();
        for alg in [
            AeadAlgorithm::Aes128Gcm,
            AeadAlgorithm::Aes256Gcm,
            AeadAlgorithm::ChaCha20Poly1305,
            AeadAlgorithm::Aes128Ccm,
            AeadAlgorithm::Aes128Ccm8,
        ] {
            assert!(provider.supports_aead(alg), "missing {:?}", alg);
        }
    }

    #[test]
    fn test_random_fill() {
        let provider = RustCryptoProvider::new();
        let a = provider.random().generate(32).unwrap();
        let b = provider.random().generate(32).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
