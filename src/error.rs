use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {name} `{value}`: {reason}")]
    Parameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Failed to load config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("Failure to read password: {reason}")]
    Input {
        reason: &'static str,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Passwords don't match")]
    Mismatch,

    #[error("Couldn't retrieve random data for salt from {}: {reason}", .device.display())]
    Entropy {
        device: PathBuf,
        reason: String,
    },

    #[error("Cryptographic error: {0}")]
    Derivation(String),

    #[error("Out of memory")]
    Allocation(#[from] TryReserveError),
}

impl Error {
    pub fn input(reason: &'static str) -> Error {
        Error::Input {
            reason,
            source: None,
        }
    }

    pub fn input_io(reason: &'static str, err: io::Error) -> Error {
        Error::Input {
            reason,
            source: Some(err),
        }
    }
}
