use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::{UpgradeConfig, PYENV_VERSION};
use crate::exec::{CommandRunner, ExecError, RunOptions};
use crate::parse;
use crate::version::{LocalVersion, PythonVersion};

#[derive(Debug, Error)]
pub enum PyenvError {
    #[error(transparent)]
    Command(#[from] ExecError),
    #[error("failed to write requirements file: {0}")]
    TempFile(#[from] std::io::Error),
}

/// pyenv and pip, driven through a [`CommandRunner`].
pub struct Pyenv<'a, R: CommandRunner> {
    runner: &'a R,
    config: &'a UpgradeConfig,
}

impl<'a, R: CommandRunner> Pyenv<'a, R> {
    pub fn new(runner: &'a R, config: &'a UpgradeConfig) -> Self {
        Self { runner, config }
    }

    /// `pyenv versions`, parsed.
    pub fn local_versions(&self) -> Result<Vec<LocalVersion>, PyenvError> {
        info!("Get local versions...");
        let out = self.pyenv(None, &["versions"])?;
        Ok(parse::local_versions(&String::from_utf8_lossy(&out)))
    }

    /// `pyenv install --list`, reduced to the newest release per major.
    pub fn installable_latests(&self) -> Result<BTreeMap<u64, PythonVersion>, PyenvError> {
        info!("Get installable versions...");
        let out = self.pyenv(None, &["install", "--list"])?;
        Ok(parse::installable_latests(&String::from_utf8_lossy(&out)))
    }

    /// Install a runtime, then upgrade pip inside it.
    pub fn install(&self, version: &PythonVersion) -> Result<(), PyenvError> {
        let ver = version.to_string();
        info!("Install a version {ver}");
        self.pyenv(None, &["install", ver.as_str()])?;
        self.pip(&ver, &["install", "--upgrade", "pip"])?;
        Ok(())
    }

    /// Re-create `local` on `target`, carrying its installed packages over.
    ///
    /// Steps run in order and stop at the first failure. Nothing is rolled
    /// back: a failure after the uninstall leaves the environment gone.
    /// Returns the path of the requirements file, which is left in place.
    pub fn update(&self, local: &LocalVersion, target: &PythonVersion) -> Result<PathBuf, PyenvError> {
        info!("Freezing pip in {local}");
        let frozen = self.pip(&local.environ, &["freeze"])?;
        let requirements = self.put_temp_file(&frozen)?;

        info!("Uninstalling {local}");
        self.pyenv(Some("system"), &["uninstall", "-f", local.environ.as_str()])?;

        let new_env = LocalVersion {
            current: false,
            environ: local.environ.clone(),
            version: target.clone(),
        };
        info!("Creating {new_env}");
        let ver = target.to_string();
        self.pyenv(Some("system"), &["virtualenv", ver.as_str(), local.environ.as_str()])?;

        info!("Unfreezing {new_env}");
        let path = requirements.to_string_lossy().into_owned();
        self.pip(&new_env.environ, &["install", "-r", path.as_str()])?;
        Ok(requirements)
    }

    fn pyenv(&self, pin: Option<&str>, args: &[&str]) -> Result<Vec<u8>, ExecError> {
        let mut options = RunOptions::new(self.config.verbose);
        if let Some(pin) = pin {
            options = options.env(PYENV_VERSION, pin);
        }
        self.runner.run(&self.config.pyenv_bin, args, &options)
    }

    fn pip(&self, pin: &str, args: &[&str]) -> Result<Vec<u8>, ExecError> {
        let options = RunOptions::new(self.config.verbose).env(PYENV_VERSION, pin);
        self.runner.run(&self.config.pip_bin, args, &options)
    }

    /// Write `body` to a fresh `pyenv*` file in the temp dir and keep it.
    fn put_temp_file(&self, body: &[u8]) -> std::io::Result<PathBuf> {
        let mut tmp = tempfile::Builder::new()
            .prefix("pyenv")
            .tempfile_in(&self.config.temp_dir)?;
        tmp.write_all(body)?;
        tmp.flush()?;
        tmp.into_temp_path().keep().map_err(|e| e.error)
    }
}
