//! Which runtimes to install and which environments to move onto them.
//!
//! Maps are keyed by major version and iterated in ascending order, so the
//! prompts always come in the same sequence for the same listings.

use std::collections::BTreeMap;

use tracing::debug;

use crate::version::{LocalVersion, PythonVersion};

pub type LatestByMajor = BTreeMap<u64, PythonVersion>;

/// A newer runtime the user may install for one major line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCandidate {
    pub major: u64,
    pub installed: PythonVersion,
    pub available: PythonVersion,
}

/// A named environment whose base runtime is older than the newest local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentCandidate {
    pub local: LocalVersion,
    pub target: PythonVersion,
}

/// Newest locally installed version per major, environments included.
pub fn local_latests(locals: &[LocalVersion]) -> LatestByMajor {
    let mut latests = LatestByMajor::new();
    for loc in locals {
        let major = loc.version.major();
        match latests.get(&major) {
            Some(old) if !loc.version.is_newer_than(old) => {}
            _ => {
                latests.insert(major, loc.version.clone());
            }
        }
    }
    latests
}

pub fn install_candidates(
    local_latests: &LatestByMajor,
    remote_latests: &LatestByMajor,
) -> Vec<InstallCandidate> {
    local_latests
        .iter()
        .filter_map(|(major, installed)| {
            let available = remote_latests.get(major)?;
            if !available.is_newer_than(installed) {
                debug!("{installed} is the newest {major}.x");
                return None;
            }
            Some(InstallCandidate {
                major: *major,
                installed: installed.clone(),
                available: available.clone(),
            })
        })
        .collect()
}

/// Environments to re-create, in listing order. Pass the local latests as
/// they stand after any accepted installs.
pub fn environment_candidates(
    locals: &[LocalVersion],
    local_latests: &LatestByMajor,
) -> Vec<EnvironmentCandidate> {
    locals
        .iter()
        .filter(|loc| loc.is_environment())
        .filter_map(|loc| {
            let latest = local_latests.get(&loc.version.major())?;
            latest.is_newer_than(&loc.version).then(|| EnvironmentCandidate {
                local: loc.clone(),
                target: latest.clone(),
            })
        })
        .collect()
}
