//! Operating-system CSPRNG.

use rand::rngs::OsRng;
use rand::RngCore;
use reltls_crypto::{Random, Result};

/// Random number generator backed by the operating system's entropy source.
#[derive(Debug, Default)]
pub(crate) struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.fill_bytes(dest);
        Ok(())
    }
}
