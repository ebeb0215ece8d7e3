use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};

/// Logged at warn level on platforms whose random device is not vetted.
pub const UNVETTED_DEVICE_WARNING: &str = "your random generator isn't known to be secure";

/// Where salt bytes come from.
pub trait EntropySource {
    /// Fill all of `salt`, or fail without handing out a partial salt.
    fn fill(&mut self, salt: &mut [u8]) -> Result<()>;
}

/// Reads salt from a random device such as `/dev/random`.
#[derive(Debug, Clone)]
pub struct RandomDevice {
    path: PathBuf,
}

impl RandomDevice {
    pub fn new(path: impl Into<PathBuf>) -> RandomDevice {
        if !cfg!(any(target_os = "linux", target_os = "freebsd")) {
            warn!("{UNVETTED_DEVICE_WARNING}");
        }
        RandomDevice { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failure(&self, reason: impl ToString) -> Error {
        Error::Entropy {
            device: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl EntropySource for RandomDevice {
    fn fill(&mut self, salt: &mut [u8]) -> Result<()> {
        debug!("Reading {} salt bytes from {}", salt.len(), self.path.display());
        let mut device = File::open(&self.path).map_err(|e| self.failure(e))?;
        device.read_exact(salt).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => self.failure("short read"),
            _ => self.failure(e),
        })
    }
}
