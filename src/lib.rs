//! Derive a `grub.pbkdf2.sha512.*` password hash for a GRUB configuration.
//!
//! The password is read twice without echo, salted with bytes from the
//! system random device and stretched with PBKDF2-HMAC-SHA-512. Password,
//! salt and derived key are wiped from memory however the run ends.

pub mod config;
pub mod encode;
pub mod entropy;
pub mod error;
pub mod kdf;
pub mod params;
pub mod pipeline;
pub mod prompt;
pub mod secret;

pub use encode::Credential;
pub use error::{Error, Result};
pub use params::Parameters;
pub use pipeline::{Controller, Failure, Stage};
