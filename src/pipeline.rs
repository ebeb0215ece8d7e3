//! One run of the tool: prompt, salt, derive, encode.
//!
//! [`Controller`] walks the stages in order and keeps every secret buffer it
//! allocates in a [`Secrets`] registry. Whichever way the run ends, the
//! registry is destroyed before [`Controller::run`] returns.

use std::fmt;

use log::debug;

use crate::encode::Credential;
use crate::entropy::EntropySource;
use crate::error::{Error, Result};
use crate::kdf;
use crate::params::Parameters;
use crate::prompt::{self, Console};
use crate::secret::{SecretBuffer, Secrets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ParamsResolved,
    Prompted,
    SaltGenerated,
    Derived,
    Encoded,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ParamsResolved => "params-resolved",
            Stage::Prompted => "prompted",
            Stage::SaltGenerated => "salt-generated",
            Stage::Derived => "derived",
            Stage::Encoded => "encoded",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A run that ended in the failed state; `stage` is the last stage reached.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Failure {
    pub stage: Stage,
    #[source]
    pub error: Error,
}

pub struct Controller<C, E> {
    params: Parameters,
    console: C,
    entropy: E,
    stage: Stage,
    secrets: Secrets,
}

impl<C: Console, E: EntropySource> Controller<C, E> {
    pub fn new(params: Parameters, console: C, entropy: E) -> Controller<C, E> {
        let mut controller = Controller {
            params,
            console,
            entropy,
            stage: Stage::Init,
            secrets: Secrets::default(),
        };
        controller.enter(Stage::ParamsResolved);
        controller
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn entropy(&self) -> &E {
        &self.entropy
    }

    /// Number of secret buffers currently alive. Zero once `run` has returned.
    pub fn live_secrets(&self) -> usize {
        self.secrets.live()
    }

    pub fn run(&mut self) -> std::result::Result<Credential, Failure> {
        let outcome = self.advance();
        self.secrets.destroy_all();
        match outcome {
            Ok(credential) => {
                self.enter(Stage::Done);
                Ok(credential)
            }
            Err(error) => {
                debug!("Run failed after stage {}", self.stage);
                Err(Failure {
                    stage: self.stage,
                    error,
                })
            }
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Stage {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn advance(&mut self) -> Result<Credential> {
        self.secrets.password = Some(prompt::read_password(&mut self.console)?);
        self.enter(Stage::Prompted);

        let salt = self
            .secrets
            .salt
            .insert(SecretBuffer::zeroed(self.params.saltlen.get())?);
        self.entropy.fill(salt.as_mut_bytes())?;
        self.enter(Stage::SaltGenerated);

        self.secrets.key = Some(SecretBuffer::zeroed(self.params.buflen.get())?);
        let derived = match &mut self.secrets {
            Secrets {
                password: Some(password),
                salt: Some(salt),
                key: Some(key),
            } => kdf::derive(
                password.as_bytes(),
                salt.as_bytes(),
                self.params.iteration_count.get(),
                key.as_mut_bytes(),
            ),
            _ => Err(missing_material()),
        };
        if let Some(password) = self.secrets.password.take() {
            password.destroy();
        }
        derived?;
        self.enter(Stage::Derived);

        let credential = match &self.secrets {
            Secrets {
                salt: Some(salt),
                key: Some(key),
                ..
            } => Credential::new(&self.params, salt.as_bytes(), key.as_bytes())?,
            _ => return Err(missing_material()),
        };
        self.enter(Stage::Encoded);
        Ok(credential)
    }
}

fn missing_material() -> Error {
    Error::Derivation("key material released early".to_owned())
}
