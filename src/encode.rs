use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::params::Parameters;

pub const ALGORITHM_TAG: &str = "grub.pbkdf2.sha512";

/// Upper-case hex, high nibble first, no separators.
///
/// The text is written into one exactly-sized allocation, so no partial copy
/// is ever released unwiped.
pub fn hexify(bytes: &[u8]) -> Result<Zeroizing<String>> {
    let len = bytes
        .len()
        .checked_mul(2)
        .ok_or_else(|| Error::Derivation("value too long to hex-encode".to_owned()))?;
    let mut text = Zeroizing::new(Vec::new());
    text.try_reserve_exact(len)?;
    text.resize(len, 0);
    hex::encode_to_slice(bytes, &mut text[..])
        .map_err(|e| Error::Derivation(format!("hex encoding failed: {e}")))?;
    text.make_ascii_uppercase();
    match String::from_utf8(std::mem::take(&mut *text)) {
        Ok(hex) => Ok(Zeroizing::new(hex)),
        Err(e) => {
            e.into_bytes().zeroize();
            Err(Error::Derivation("hex encoding produced invalid text".to_owned()))
        }
    }
}

/// A finished `grub.pbkdf2.sha512.<iterations>.<salt>.<key>` line.
pub struct Credential {
    iteration_count: u32,
    salt_hex: Zeroizing<String>,
    key_hex: Zeroizing<String>,
}

impl Credential {
    pub fn new(params: &Parameters, salt: &[u8], key: &[u8]) -> Result<Credential> {
        Ok(Credential {
            iteration_count: params.iteration_count.get(),
            salt_hex: hexify(salt)?,
            key_hex: hexify(key)?,
        })
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn salt_hex(&self) -> &str {
        &self.salt_hex
    }

    pub fn key_hex(&self) -> &str {
        &self.key_hex
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            ALGORITHM_TAG,
            self.iteration_count,
            self.salt_hex.as_str(),
            self.key_hex.as_str()
        )
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("iteration_count", &self.iteration_count)
            .field("salt_len", &(self.salt_hex.len() / 2))
            .field("key_len", &(self.key_hex.len() / 2))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nibbles_map_to_upper_case_digits() {
        assert_eq!(hexify(&[0x00, 0x09, 0x0a, 0xf0, 0xff]).unwrap().as_str(), "00090AF0FF");
        assert_eq!(hexify(&[]).unwrap().as_str(), "");
    }

    #[test]
    fn hex_text_is_one_exact_allocation() {
        let encoded = hexify(&[0x5a; 40]).unwrap();
        assert_eq!(encoded.len(), 80);
        assert_eq!(encoded.capacity(), 80);
    }

    #[test]
    fn credential_line_layout() {
        let params = Parameters::new(1, 4, 4).unwrap();
        let credential = Credential::new(&params, &[0, 1, 2, 3], &[0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(
            credential.to_string(),
            "grub.pbkdf2.sha512.1.00010203.DEADBEEF"
        );
        assert_eq!(credential.iteration_count(), 1);
    }

    #[test]
    fn debug_hides_hex() {
        let params = Parameters::new(5, 2, 2).unwrap();
        let credential = Credential::new(&params, &[0xaa, 0xbb], &[0xcc, 0xdd]).unwrap();
        let shown = format!("{credential:?}");
        assert!(!shown.contains("AABB"));
        assert!(!shown.contains("CCDD"));
    }

    proptest! {
        #[test]
        fn hex_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = hexify(&bytes).unwrap();
            prop_assert_eq!(encoded.len(), bytes.len() * 2);
            prop_assert!(encoded.bytes().all(|c| matches!(c, b'0'..=b'9' | b'A'..=b'F')));
            prop_assert_eq!(hex::decode(encoded.as_str()).unwrap(), bytes);
        }
    }
}
