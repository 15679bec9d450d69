// main.rs — arg parsing and orchestration only.
mod config;
mod exec;
mod parse;
mod plan;
mod prompt;
mod pyenv;
mod upgrade;
mod version;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::upgrade_config;
use exec::SystemRunner;
use prompt::TerminalPrompter;
use pyenv::Pyenv;
use upgrade::upgrade;

/// Upgrade all pyenv-envs
#[derive(Parser)]
#[command(name = "pyenv-upgrade", version)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = upgrade_config()?;
    let runner = SystemRunner;
    let pyenv = Pyenv::new(&runner, &config);

    let report = upgrade(&pyenv, &mut TerminalPrompter)?;
    if report.is_empty() {
        info!("nothing to upgrade");
    } else {
        info!(
            "installed {} version(s), updated {} environment(s)",
            report.installed.len(),
            report.updated.len()
        );
    }
    Ok(())
}
