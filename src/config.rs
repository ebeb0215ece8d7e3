use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Optional defaults read from a TOML file, e.g.
///
/// ```toml
/// iteration_count = 100000
/// buflen = 64
/// saltlen = 64
/// random_device = "/dev/urandom"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub iteration_count: Option<u32>,
    pub buflen: Option<usize>,
    pub saltlen: Option<usize>,
    pub random_device: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file(fname: &Path) -> Result<FileConfig> {
        info!("Loading config from {}", fname.display());
        let src = std::fs::read_to_string(fname).map_err(|e| Error::Config {
            path: fname.to_owned(),
            reason: e.to_string(),
        })?;
        toml::from_str(&src).map_err(|e| Error::Config {
            path: fname.to_owned(),
            reason: e.message().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_all_keys() {
        let file = write_config(
            "iteration_count = 100000\nbuflen = 32\nsaltlen = 16\nrandom_device = \"/dev/urandom\"\n",
        );
        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config,
            FileConfig {
                iteration_count: Some(100000),
                buflen: Some(32),
                saltlen: Some(16),
                random_device: Some(PathBuf::from("/dev/urandom")),
            }
        );
    }

    #[test]
    fn keys_are_optional() {
        let file = write_config("buflen = 128\n");
        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.buflen, Some(128));
        assert_eq!(config.iteration_count, None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let file = write_config("iterations = 5\n");
        let err = FileConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn negative_value_is_rejected() {
        let file = write_config("saltlen = -1\n");
        assert!(FileConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
