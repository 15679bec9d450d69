use std::path::PathBuf;
use thiserror::Error;

/// Variable that pins the runtime pyenv shims resolve to.
pub const PYENV_VERSION: &str = "PYENV_VERSION";

#[derive(Debug, Clone)]
pub struct UpgradeConfig {
    pub pyenv_bin: String, // PYENV_UPGRADE_PYENV, default "pyenv"
    pub pip_bin: String,   // PYENV_UPGRADE_PIP, default "pip"
    pub temp_dir: PathBuf, // PYENV_UPGRADE_TMPDIR, default OS temp dir
    /// Forward subprocess stdout live. Off with PYENV_UPGRADE_QUIET=1.
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is set but empty")]
    Empty(&'static str),
}

pub fn upgrade_config() -> Result<UpgradeConfig, ConfigError> {
    let pyenv_bin = non_empty_var("PYENV_UPGRADE_PYENV")?.unwrap_or_else(|| "pyenv".to_string());
    let pip_bin = non_empty_var("PYENV_UPGRADE_PIP")?.unwrap_or_else(|| "pip".to_string());
    let temp_dir = non_empty_var("PYENV_UPGRADE_TMPDIR")?
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let quiet = std::env::var("PYENV_UPGRADE_QUIET")
        .map(|v| v == "1")
        .unwrap_or(false);

    Ok(UpgradeConfig {
        pyenv_bin,
        pip_bin,
        temp_dir,
        verbose: !quiet,
    })
}

fn non_empty_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(v) if v.is_empty() => Err(ConfigError::Empty(name)),
        Ok(v) => Ok(Some(v)),
        Err(_) => Ok(None),
    }
}
