//! Raw CBC block cipher implementations backed by `cbc` + `aes`/`des`.

use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use reltls_crypto::{BlockCipher, CbcAlgorithm, Error, Result};

/// Create a CBC block cipher instance for the specified algorithm.
pub(crate) fn create_block_cipher(algorithm: CbcAlgorithm) -> Result<Box<dyn BlockCipher>> {
    Ok(Box::new(RustCryptoCbc { algorithm }))
}

struct RustCryptoCbc {
    algorithm: CbcAlgorithm,
}

impl RustCryptoCbc {
    fn check_inputs(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<()> {
        if key.len() != self.algorithm.key_size() {
            return Err(Error::InvalidKeySize {
                expected: self.algorithm.key_size(),
                actual: key.len(),
            });
        }
        if iv.len() != self.algorithm.iv_size() {
            return Err(Error::InvalidNonceSize {
                expected: self.algorithm.iv_size(),
                actual: iv.len(),
            });
        }
        if data.is_empty() || data.len() % self.algorithm.block_size() != 0 {
            return Err(Error::InvalidLength);
        }
        Ok(())
    }
}

macro_rules! dispatch_cbc_encrypt {
    ($cipher:ty, $key:expr, $iv:expr, $data:expr) => {{
        let enc = cbc::Encryptor::<$cipher>::new_from_slices($key, $iv)
            .map_err(|_| Error::Internal("CBC key/IV rejected".into()))?;
        Ok(enc.encrypt_padded_vec_mut::<NoPadding>($data))
    }};
}

macro_rules! dispatch_cbc_decrypt {
    ($cipher:ty, $key:expr, $iv:expr, $data:expr) => {{
        let dec = cbc::Decryptor::<$cipher>::new_from_slices($key, $iv)
            .map_err(|_| Error::Internal("CBC key/IV rejected".into()))?;
        dec.decrypt_padded_vec_mut::<NoPadding>($data)
            .map_err(|_| Error::InvalidLength)
    }};
}

impl BlockCipher for RustCryptoCbc {
    fn encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.check_inputs(key, iv, data)?;
        match self.algorithm {
            CbcAlgorithm::Aes128Cbc => dispatch_cbc_encrypt!(aes::Aes128, key, iv, data),
            CbcAlgorithm::Aes256Cbc => dispatch_cbc_encrypt!(aes::Aes256, key, iv, data),
            CbcAlgorithm::TripleDesEdeCbc => dispatch_cbc_encrypt!(des::TdesEde3, key, iv, data),
        }
    }

    fn decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.check_inputs(key, iv, data)?;
        match self.algorithm {
            CbcAlgorithm::Aes128Cbc => dispatch_cbc_decrypt!(aes::Aes128, key, iv, data),
            CbcAlgorithm::Aes256Cbc => dispatch_cbc_decrypt!(aes::Aes256, key, iv, data),
            CbcAlgorithm::TripleDesEdeCbc => dispatch_cbc_decrypt!(des::TdesEde3, key, iv, data),
        }
    }

    fn algorithm(&self) -> CbcAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(algorithm: CbcAlgorithm) {
        let cipher = create_block_cipher(algorithm).unwrap();
        let key = vec![0x11u8; algorithm.key_size()];
        let iv = vec![0x22u8; algorithm.iv_size()];
        let data = vec![0x33u8; algorithm.block_size() * 3];

        let encrypted = cipher.encrypt(&key, &iv, &data).unwrap();
        assert_eq!(encrypted.len(), data.len());
        assert_ne!(encrypted, data);

        let decrypted = cipher.decrypt(&key, &iv, &encrypted).unwrap();
        assert_eq!(decrypted, data);
    }

    #[test]
    fn test_cbc_roundtrip_all_algorithms() {
        for alg in [
            CbcAlgorithm::Aes128Cbc,
            CbcAlgorithm::Aes256Cbc,
            CbcAlgorithm::TripleDesEdeCbc,
        ] {
            roundtrip(alg);
        }
    }

    #[test]
    fn test_partial_block_rejected() {
        let cipher = create_block_cipher(CbcAlgorithm::Aes128Cbc).unwrap();
        let result = cipher.encrypt(&[0u8; 16], &[0u8; 16], &[0u8; 15]);
        assert_eq!(result, Err(Error::InvalidLength));
    }

    #[test]
    fn test_wrong_iv_size_rejected() {
        let cipher = create_block_cipher(CbcAlgorithm::TripleDesEdeCbc).unwrap();
        let result = cipher.encrypt(&[0u8; 24], &[0u8; 16], &[0u8; 8]);
        assert_eq!(
            result,
            Err(Error::InvalidNonceSize {
                expected: 8,
                actual: 16
            })
        );
    }
}
