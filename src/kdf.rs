use hmac::Hmac;
use log::debug;
use sha2::Sha512;

use crate::error::{Error, Result};

const SHA512_OUTPUT_LEN: u64 = 64;

/// PBKDF2 cannot produce more than `(2^32 - 1)` blocks of hash output.
pub const MAX_OUTPUT_LEN: u64 = (u32::MAX as u64) * SHA512_OUTPUT_LEN;

/// Fill `out` with PBKDF2-HMAC-SHA-512 of `password` and `salt`.
pub fn derive(password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) -> Result<()> {
    if iterations == 0 {
        return Err(Error::Derivation("iteration count must be non-zero".to_owned()));
    }
    if out.is_empty() || out.len() as u64 > MAX_OUTPUT_LEN {
        return Err(Error::Derivation(format!(
            "derived key length {} out of range",
            out.len()
        )));
    }
    debug!(
        "Deriving {} bytes with {} iterations over a {} byte salt",
        out.len(),
        iterations,
        salt.len()
    );
    pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, iterations, out)
        .map_err(|e| Error::Derivation(format!("PBKDF2 failed: {e}")))
}
