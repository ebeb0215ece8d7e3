use std::num::{IntErrorKind, NonZeroU32, NonZeroUsize};
use std::path::PathBuf;

use log::debug;

use crate::config::FileConfig;
use crate::error::{Error, Result};

pub const DEFAULT_ITERATION_COUNT: u32 = 10000;
pub const DEFAULT_BUFLEN: usize = 64;
pub const DEFAULT_SALTLEN: usize = 64;
pub const DEFAULT_RANDOM_DEVICE: &str = "/dev/random";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    pub iteration_count: NonZeroU32,
    /// Length of the derived key in bytes.
    pub buflen: NonZeroUsize,
    /// Length of the salt in bytes.
    pub saltlen: NonZeroUsize,
}

impl Parameters {
    pub fn new(iteration_count: u32, buflen: usize, saltlen: usize) -> Result<Parameters> {
        Ok(Parameters {
            iteration_count: positive("iteration count", iteration_count)?,
            buflen: positive("buflen", buflen)?,
            saltlen: positive("saltlen", saltlen)?,
        })
    }
}

fn positive<T, N>(name: &'static str, value: T) -> Result<N>
where
    T: Copy + ToString + TryInto<N>,
{
    value.try_into().map_err(|_| Error::Parameter {
        name,
        value: value.to_string(),
        reason: "must be a positive integer",
    })
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub iteration_count: Option<u32>,
    pub buflen: Option<usize>,
    pub saltlen: Option<usize>,
    pub random_device: Option<PathBuf>,
}

/// Everything a run needs before it starts prompting.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub params: Parameters,
    pub random_device: PathBuf,
}

/// Command line first, then the config file, then the built-in defaults.
pub fn resolve(cli: &Overrides, file: Option<&FileConfig>) -> Result<Resolved> {
    let file = file.cloned().unwrap_or_default();
    let params = Parameters::new(
        cli.iteration_count
            .or(file.iteration_count)
            .unwrap_or(DEFAULT_ITERATION_COUNT),
        cli.buflen.or(file.buflen).unwrap_or(DEFAULT_BUFLEN),
        cli.saltlen.or(file.saltlen).unwrap_or(DEFAULT_SALTLEN),
    )?;
    let random_device = cli
        .random_device
        .clone()
        .or(file.random_device)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RANDOM_DEVICE));
    debug!(
        "Resolved parameters: {} iterations, buflen {}, saltlen {}, device {}",
        params.iteration_count,
        params.buflen,
        params.saltlen,
        random_device.display()
    );
    Ok(Resolved {
        params,
        random_device,
    })
}

/// Parse an unsigned count the way `strtoul(s, NULL, 0)` reads it:
/// `0x` prefix for hex, a leading `0` for octal, decimal otherwise.
pub fn parse_count<T>(name: &'static str, s: &str) -> Result<T>
where
    T: TryFrom<u64>,
{
    let invalid = |reason| Error::Parameter {
        name,
        value: s.to_owned(),
        reason,
    };
    let trimmed = s.trim();
    let (digits, radix) = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        (hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (&trimmed[1..], 8)
    } else {
        (trimmed, 10)
    };
    if digits.is_empty() || digits.starts_with(&['+', '-'][..]) {
        return Err(invalid("not an unsigned number"));
    }
    let value = u64::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => invalid("too large"),
        _ => invalid("not an unsigned number"),
    })?;
    if value == 0 {
        return Err(invalid("must be a positive integer"));
    }
    T::try_from(value).map_err(|_| invalid("too large"))
}
