//! Heap buffers for passwords, salts and derived keys.
//!
//! Every byte a [`SecretBuffer`] ever held is overwritten with zeroes before
//! the allocation goes back to the allocator: on drop, on [`SecretBuffer::destroy`]
//! and whenever the buffer has to move to a larger allocation.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;

const MIN_CAPACITY: usize = 64;

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBuffer {
    bytes: Vec<u8>,
}

impl SecretBuffer {
    /// An empty buffer that can take `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Result<SecretBuffer> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(capacity)?;
        Ok(SecretBuffer { bytes })
    }

    /// A buffer of `len` zero bytes, ready to be filled in place.
    pub fn zeroed(len: usize) -> Result<SecretBuffer> {
        let mut buffer = SecretBuffer::with_capacity(len)?;
        buffer.bytes.resize(len, 0);
        Ok(buffer)
    }

    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.bytes.len() == self.bytes.capacity() {
            self.grow()?;
        }
        self.bytes.push(byte);
        Ok(())
    }

    // Vec's own growth would hand the old allocation back without wiping it.
    fn grow(&mut self) -> Result<()> {
        let wanted = (self.bytes.capacity() * 2).max(MIN_CAPACITY);
        let mut larger = Vec::new();
        larger.try_reserve_exact(wanted)?;
        larger.extend_from_slice(&self.bytes);
        let mut old = std::mem::replace(&mut self.bytes, larger);
        old.zeroize();
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Wipe the contents and release the storage.
    pub fn destroy(self) {
        drop(self);
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer([REDACTED; {}])", self.bytes.len())
    }
}

/// The live secret buffers of one run.
///
/// The controller parks every buffer it allocates here so that a single
/// [`Secrets::destroy_all`] wipes whatever exists at the moment a run ends.
#[derive(Debug, Default)]
pub struct Secrets {
    pub password: Option<SecretBuffer>,
    pub salt: Option<SecretBuffer>,
    pub key: Option<SecretBuffer>,
}

impl Secrets {
    pub fn live(&self) -> usize {
        [&self.password, &self.salt, &self.key]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    pub fn destroy_all(&mut self) {
        for slot in [&mut self.password, &mut self.salt, &mut self.key] {
            if let Some(buffer) = slot.take() {
                buffer.destroy();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_contents_across_growth() {
        let mut buffer = SecretBuffer::with_capacity(1).unwrap();
        for byte in 0..200u8 {
            buffer.push(byte).unwrap();
        }
        assert_eq!(buffer.len(), 200);
        assert!(buffer.as_bytes().iter().copied().eq(0..200u8));
    }

    #[test]
    fn zeroed_has_requested_length() {
        let buffer = SecretBuffer::zeroed(16).unwrap();
        assert_eq!(buffer.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn zeroize_clears_contents() {
        let mut buffer = SecretBuffer::with_capacity(4).unwrap();
        buffer.push(7).unwrap();
        buffer.zeroize();
        assert!(buffer.is_empty());
    }

    #[test]
    fn debug_does_not_show_bytes() {
        let mut buffer = SecretBuffer::with_capacity(4).unwrap();
        buffer.push(b'x').unwrap();
        assert_eq!(format!("{buffer:?}"), "SecretBuffer([REDACTED; 1])");
    }

    #[test]
    fn absurd_capacity_is_an_allocation_error() {
        let err = SecretBuffer::with_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, crate::Error::Allocation(_)));
    }

    #[test]
    fn destroy_all_empties_every_slot() {
        let mut secrets = Secrets {
            password: Some(SecretBuffer::zeroed(3).unwrap()),
            salt: Some(SecretBuffer::zeroed(4).unwrap()),
            key: None,
        };
        assert_eq!(secrets.live(), 2);
        secrets.destroy_all();
        assert_eq!(secrets.live(), 0);
    }
}
