//! HMAC implementations backed by `hmac` + `sha1`/`sha2`.

use hmac::{Hmac as HmacImpl, Mac};
use reltls_crypto::{Error, Hmac, MacAlgorithm, Result};
use sha1::Sha1;
use sha2::{Sha256, Sha384};

/// Create an HMAC instance keyed with `key`.
pub(crate) fn create_hmac(algorithm: MacAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    match algorithm {
        MacAlgorithm::HmacSha1 => Ok(Box::new(HmacSha1Impl::new(key)?)),
        MacAlgorithm::HmacSha256 => Ok(Box::new(HmacSha256Impl::new(key)?)),
        MacAlgorithm::HmacSha384 => Ok(Box::new(HmacSha384Impl::new(key)?)),
    }
}

macro_rules! hmac_impl {
    ($name:ident, $digest:ty, $algorithm:expr) => {
        struct $name {
            inner: HmacImpl<$digest>,
        }

        impl $name {
            fn new(key: &[u8]) -> Result<Self> {
                let inner = <HmacImpl<$digest> as Mac>::new_from_slice(key)
                    .map_err(|_| Error::Internal("HMAC key rejected".into()))?;
                Ok(Self { inner })
            }
        }

        impl Hmac for $name {
            fn update(&mut self, data: &[u8]) {
                Mac::update(&mut self.inner, data);
            }

            fn finalize(self: Box<Self>) -> Vec<u8> {
                self.inner.finalize().into_bytes().to_vec()
            }

            fn output_size(&self) -> usize {
                $algorithm.output_size()
            }

            fn algorithm(&self) -> MacAlgorithm {
                $algorithm
            }
        }
    };
}

hmac_impl!(HmacSha1Impl, Sha1, MacAlgorithm::HmacSha1);
hmac_impl!(HmacSha256Impl, Sha256, MacAlgorithm::HmacSha256);
hmac_impl!(HmacSha384Impl, Sha384, MacAlgorithm::HmacSha384);

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test case 2 ("what do ya want for nothing?", key "Jefe").
    #[test]
    fn test_hmac_sha256_rfc4231_vector() {
        let mut mac = create_hmac(MacAlgorithm::HmacSha256, b"Jefe").unwrap();
        mac.update(b"what do ya want ");
        mac.update(b"for nothing?");
        let tag = mac.finalize();
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_verify_constant_time_path() {
        let mut mac = create_hmac(MacAlgorithm::HmacSha1, b"key").unwrap();
        mac.update(b"message");
        let tag = mac.finalize();
        assert_eq!(tag.len(), 20);

        let mut mac = create_hmac(MacAlgorithm::HmacSha1, b"key").unwrap();
        mac.update(b"message");
        assert!(mac.verify(&tag));

        let mut mac = create_hmac(MacAlgorithm::HmacSha1, b"key").unwrap();
        mac.update(b"message");
        let mut bad = tag.clone();
        bad[0] ^= 1;
        assert!(!mac.verify(&bad));
    }

    #[test]
    fn test_output_sizes() {
        for (alg, len) in [
            (MacAlgorithm::HmacSha1, 20),
            (MacAlgorithm::HmacSha256, 32),
            (MacAlgorithm::HmacSha384, 48),
        ] {
            let mut mac = create_hmac(alg, b"k").unwrap();
            mac.update(b"data");
            assert_eq!(mac.output_size(), len);
            assert_eq!(mac.finalize().len(), len);
        }
    }
}
