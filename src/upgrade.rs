use anyhow::Context;
use tracing::debug;

use crate::exec::CommandRunner;
use crate::plan::{environment_candidates, install_candidates, local_latests};
use crate::prompt::Prompter;
use crate::pyenv::Pyenv;
use crate::version::{LocalVersion, PythonVersion};

/// What a run actually changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub installed: Vec<PythonVersion>,
    /// Environments as re-created, bound to their new version.
    pub updated: Vec<LocalVersion>,
}

impl UpgradeReport {
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty() && self.updated.is_empty()
    }
}

/// Offer every newer runtime, then every environment that can move onto a
/// newer local runtime. Each accepted action runs before the next question.
///
/// Any failure (command, temp file or prompt) ends the run.
pub fn upgrade<R: CommandRunner, P: Prompter>(
    pyenv: &Pyenv<'_, R>,
    prompter: &mut P,
) -> anyhow::Result<UpgradeReport> {
    let locals = pyenv
        .local_versions()
        .context("failed to list local versions")?;
    let remote = pyenv
        .installable_latests()
        .context("failed to list installable versions")?;

    let mut latests = local_latests(&locals);
    let mut report = UpgradeReport::default();

    for candidate in install_candidates(&latests, &remote) {
        debug!("{} -> {}", candidate.installed, candidate.available);
        if !prompter.confirm(&format!("Install {}?", candidate.available))? {
            debug!("declined {}", candidate.available);
            continue;
        }
        pyenv
            .install(&candidate.available)
            .with_context(|| format!("failed to install {}", candidate.available))?;
        latests.insert(candidate.major, candidate.available.clone());
        report.installed.push(candidate.available);
    }

    for candidate in environment_candidates(&locals, &latests) {
        let question = format!("Update {} to {}?", candidate.local, candidate.target);
        if !prompter.confirm(&question)? {
            debug!("declined update of {}", candidate.local);
            continue;
        }
        pyenv
            .update(&candidate.local, &candidate.target)
            .with_context(|| format!("failed to update {}", candidate.local))?;
        report.updated.push(LocalVersion {
            current: false,
            environ: candidate.local.environ,
            version: candidate.target,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpgradeConfig;
    use crate::exec::fake::FakeRunner;
    use crate::prompt::PromptError;
    use std::collections::VecDeque;
    use std::path::Path;
    use tempfile::tempdir;

    /// Answers from a script; running out is a read failure.
    struct ScriptedPrompter {
        answers: VecDeque<bool>,
        asked: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
            self.asked.push(question.to_string());
            self.answers.pop_front().ok_or_else(|| PromptError::Read {
                question: question.to_string(),
                source: dialoguer::Error::IO(std::io::Error::from(
                    std::io::ErrorKind::UnexpectedEof,
                )),
            })
        }
    }

    fn make_config(temp_dir: &Path) -> UpgradeConfig {
        UpgradeConfig {
            pyenv_bin: "pyenv".to_string(),
            pip_bin: "pip".to_string(),
            temp_dir: temp_dir.to_path_buf(),
            verbose: false,
        }
    }

    const VERSIONS: &str = "* 3.9.1/envs/a (set by /home/me/.python-version)\n  3.8.0\n  system\n";
    const INSTALL_LIST: &str = "Available versions:\n  3.8.18\n  3.9.5\n  3.10-dev\n  3.9.6a1\n";

    fn runner() -> FakeRunner {
        FakeRunner::default()
            .with_output("pyenv versions", VERSIONS)
            .with_output("pyenv install --list", INSTALL_LIST)
    }

    #[test]
    fn declining_everything_only_reads_listings() {
        let dir = tempdir().unwrap();
        let config = make_config(dir.path());
        let runner = runner();
        let mut prompter = ScriptedPrompter::new(&[false]);

        let report = upgrade(&Pyenv::new(&runner, &config), &mut prompter).unwrap();

        assert!(report.is_empty());
        assert_eq!(prompter.asked, vec!["Install 3.9.5?"]);
        assert_eq!(
            runner.commands(),
            vec!["pyenv versions", "pyenv install --list"]
        );
    }

    #[test]
    fn accepted_install_offers_environment_update() {
        let dir = tempdir().unwrap();
        let config = make_config(dir.path());
        let runner = runner().with_output("pip freeze", "six==1.16.0\n");
        let mut prompter = ScriptedPrompter::new(&[true, true]);

        let report = upgrade(&Pyenv::new(&runner, &config), &mut prompter).unwrap();

        assert_eq!(
            prompter.asked,
            vec!["Install 3.9.5?", "Update 3.9.1/envs/a to 3.9.5?"]
        );
        assert_eq!(report.installed, vec![PythonVersion::new(3, 9, 5)]);
        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.updated[0].to_string(), "3.9.5/envs/a");

        let commands = runner.commands();
        assert_eq!(
            &commands[..6],
            &[
                "pyenv versions",
                "pyenv install --list",
                "pyenv install 3.9.5",
                "pip install --upgrade pip",
                "pip freeze",
                "pyenv uninstall -f a",
            ]
        );
        assert_eq!(commands[6], "pyenv virtualenv 3.9.5 a");
        assert!(commands[7].starts_with("pip install -r "));
        assert_eq!(commands.len(), 8);
    }

    #[test]
    fn declined_install_leaves_environment_alone() {
        let dir = tempdir().unwrap();
        let config = make_config(dir.path());
        let runner = runner();
        let mut prompter = ScriptedPrompter::new(&[false]);

        upgrade(&Pyenv::new(&runner, &config), &mut prompter).unwrap();

        assert!(prompter.asked.iter().all(|q| !q.starts_with("Update")));
    }

    #[test]
    fn environment_on_older_local_runtime_is_offered_without_install() {
        let dir = tempdir().unwrap();
        let config = make_config(dir.path());
        let runner = FakeRunner::default()
            .with_output("pyenv versions", "  3.8.0/envs/old\n* 3.11.4\n")
            .with_output("pyenv install --list", "  3.11.4\n");
        let mut prompter = ScriptedPrompter::new(&[false]);

        let report = upgrade(&Pyenv::new(&runner, &config), &mut prompter).unwrap();

        assert!(report.is_empty());
        assert_eq!(prompter.asked, vec!["Update 3.8/envs/old to 3.11.4?"]);
    }

    #[test]
    fn failing_step_halts_the_run() {
        let dir = tempdir().unwrap();
        let config = make_config(dir.path());
        let runner = runner().failing_on("pyenv install 3.9.5");
        let mut prompter = ScriptedPrompter::new(&[true, true]);

        let err = upgrade(&Pyenv::new(&runner, &config), &mut prompter).unwrap_err();

        assert_eq!(err.to_string(), "failed to install 3.9.5");
        assert_eq!(prompter.asked.len(), 1);
        assert_eq!(runner.commands().last().unwrap(), "pyenv install 3.9.5");
    }

    #[test]
    fn prompt_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let config = make_config(dir.path());
        let runner = runner();
        let mut prompter = ScriptedPrompter::new(&[]);

        let err = upgrade(&Pyenv::new(&runner, &config), &mut prompter).unwrap_err();

        assert!(err.downcast_ref::<PromptError>().is_some(), "{err:#}");
        assert_eq!(runner.commands().len(), 2);
    }

    #[test]
    fn listing_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let config = make_config(dir.path());
        let runner = runner().failing_on("pyenv versions");
        let mut prompter = ScriptedPrompter::new(&[]);

        let err = upgrade(&Pyenv::new(&runner, &config), &mut prompter).unwrap_err();

        assert_eq!(err.to_string(), "failed to list local versions");
        assert!(prompter.asked.is_empty());
    }
}
