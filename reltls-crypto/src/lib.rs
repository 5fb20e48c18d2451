//! # reltls Cryptographic Provider Interface
//!
//! This crate defines the cryptographic abstraction layer consumed by the
//! record layer in `reltls-core`. It provides trait-based interfaces that
//! allow pluggable cryptographic backends.
//!
//! ## Design Goals
//!
//! 1. **Pluggable:** Support multiple primitive libraries behind one trait set
//! 2. **Object-safe:** Every cipher trait can be used as `Box<dyn ...>`
//! 3. **Constant-time:** All security-critical operations must be constant-time
//!
//! ## Architecture
//!
//! ```text
//! CryptoProvider (main trait)
//! ├── Aead        (AES-GCM, AES-CCM, ChaCha20-Poly1305)
//! ├── BlockCipher (AES-CBC, 3DES-EDE-CBC, raw and unpadded)
//! ├── Hmac        (HMAC-SHA-1, HMAC-SHA-256, HMAC-SHA-384)
//! └── Random      (CSPRNG)
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod aead;
pub mod block;
pub mod error;
pub mod hmac;
pub mod random;

pub use aead::{Aead, AeadAlgorithm};
pub use block::{BlockCipher, CbcAlgorithm};
pub use error::{Error, Result};
pub use hmac::{Hmac, MacAlgorithm};
pub use random::Random;

/// The main cryptographic provider trait.
///
/// Implementations of this trait provide every primitive the record layer
/// needs. The trait is object-safe so callers can hold a `Box<dyn
/// CryptoProvider>` or `Arc<dyn CryptoProvider>` and remain backend-agnostic.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use from multiple
/// connections at once.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Get an AEAD cipher instance.
    ///
    /// Returns an error if the algorithm is not supported by this provider.
    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>>;

    /// Get a raw (unpadded) CBC block cipher instance.
    ///
    /// Padding is the caller's responsibility; the record layer applies and
    /// verifies PKCS#7 itself so that verification can be constant-time.
    fn block_cipher(&self, algorithm: CbcAlgorithm) -> Result<Box<dyn BlockCipher>>;

    /// Get an HMAC instance keyed with `key`.
    fn hmac(&self, algorithm: MacAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>>;

    /// Get the random number generator.
    fn random(&self) -> &dyn Random;

    /// Check if the provider supports a specific AEAD algorithm.
    fn supports_aead(&self, algorithm: AeadAlgorithm) -> bool {
        self.aead(algorithm).is_ok()
    }
}
