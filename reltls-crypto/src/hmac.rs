//! HMAC (Hash-based Message Authentication Code) interface.

/// MAC algorithms used by the TLS 1.2 MAC-then-encrypt construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgorithm {
    /// HMAC-SHA-1 (20 bytes output) - legacy cipher suites
    HmacSha1,
    /// HMAC-SHA-256 (32 bytes output)
    HmacSha256,
    /// HMAC-SHA-384 (48 bytes output)
    HmacSha384,
}

impl MacAlgorithm {
    /// Get the output size in bytes for this MAC algorithm.
    pub const fn output_size(self) -> usize {
        match self {
            MacAlgorithm::HmacSha1 => 20,
            MacAlgorithm::HmacSha256 => 32,
            MacAlgorithm::HmacSha384 => 48,
        }
    }

    /// Get the name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            MacAlgorithm::HmacSha1 => "HMAC-SHA-1",
            MacAlgorithm::HmacSha256 => "HMAC-SHA-256",
            MacAlgorithm::HmacSha384 => "HMAC-SHA-384",
        }
    }
}

/// HMAC trait.
///
/// Provides HMAC computation for record authentication.
pub trait Hmac: Send {
    /// Update the HMAC state with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the HMAC and return the authentication tag.
    ///
    /// This consumes the HMAC state.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Verify an HMAC tag in constant time.
    ///
    /// Returns `true` if the tag matches. The comparison MUST be
    /// constant-time; the default implementation uses `subtle`.
    fn verify(self: Box<Self>, tag: &[u8]) -> bool {
        use subtle::ConstantTimeEq;
        let computed = self.finalize();
        computed.ct_eq(tag).into()
    }

    /// Get the output size in bytes for this HMAC.
    fn output_size(&self) -> usize;

    /// Get the algorithm used by this HMAC.
    fn algorithm(&self) -> MacAlgorithm;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_sizes() {
        assert_eq!(MacAlgorithm::HmacSha1.output_size(), 20);
        assert_eq!(MacAlgorithm::HmacSha256.output_size(), 32);
        assert_eq!(MacAlgorithm::HmacSha384.output_size(), 48);
    }
}
