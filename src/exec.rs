use std::io::{self, Read, Write};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed ({status})")]
    Failed { command: String, status: String },
    #[error("failed to read output of `{command}`: {source}")]
    Output {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// How a child's streams are wired and which variables it gets on top of
/// the inherited environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep stdout in memory and return it.
    pub capture: bool,
    /// Copy stdout to our stdout while it is produced.
    pub forward_stdout: bool,
    /// Let the child write to our stderr. Stderr is never captured.
    pub forward_stderr: bool,
    pub extra_env: Vec<(String, String)>,
}

impl RunOptions {
    pub fn new(verbose: bool) -> Self {
        Self {
            capture: true,
            forward_stdout: verbose,
            forward_stderr: true,
            extra_env: Vec::new(),
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.extra_env.push((key.to_string(), value.to_string()));
        self
    }
}

/// Runs one external command to completion.
///
/// Returns captured stdout (empty when not capturing). A nonzero exit is an error.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], options: &RunOptions) -> Result<Vec<u8>, ExecError>;
}

/// Spawns real processes and blocks until they exit.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], options: &RunOptions) -> Result<Vec<u8>, ExecError> {
        run_forwarding_to(program, args, options, &mut io::stdout().lock())
    }
}

/// Body of [`SystemRunner::run`], with forwarded stdout going to `live`.
fn run_forwarding_to(
    program: &str,
    args: &[&str],
    options: &RunOptions,
    live: &mut impl Write,
) -> Result<Vec<u8>, ExecError> {
    let command = command_line(program, args);
    debug!(env = ?options.extra_env, "running `{command}`");

    let stdout = match (options.capture, options.forward_stdout) {
        (true, _) => Stdio::piped(),
        (false, true) => Stdio::inherit(),
        (false, false) => Stdio::null(),
    };
    let stderr = if options.forward_stderr {
        Stdio::inherit()
    } else {
        Stdio::null()
    };

    let mut child = Command::new(program)
        .args(args)
        .envs(options.extra_env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::inherit())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            command: command.clone(),
            source,
        })?;

    let mut captured = Vec::new();
    if let Some(mut out) = child.stdout.take() {
        let result = if options.forward_stdout {
            tee(&mut out, &mut captured, live)
        } else {
            out.read_to_end(&mut captured).map(|_| ())
        };
        // Close our end first so a child still writing gets EPIPE instead of blocking.
        drop(out);
        if let Err(source) = result {
            child.wait().map_err(|wait_err| ExecError::Output {
                command: command.clone(),
                source: wait_err,
            })?;
            return Err(ExecError::Output { command, source });
        }
    }

    let status = child.wait().map_err(|source| ExecError::Output {
        command: command.clone(),
        source,
    })?;
    if !status.success() {
        return Err(ExecError::Failed {
            command,
            status: status.to_string(),
        });
    }
    Ok(captured)
}

pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Copy `src` into both `buf` and `live`, flushing `live` after every chunk.
fn tee(src: &mut impl Read, buf: &mut Vec<u8>, live: &mut impl Write) -> io::Result<()> {
    let mut chunk = [0u8; 8192];
    loop {
        let n = match src.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        buf.extend_from_slice(&chunk[..n]);
        live.write_all(&chunk[..n])?;
        live.flush()?;
    }
}
