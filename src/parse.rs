//! Parsers for the two pyenv listings.
//!
//! Both work line by line and never fail: a line that does not have the exact
//! expected shape is skipped. That is how `pyenv install --list` entries such
//! as `3.13-dev`, `miniconda3-latest` or `3.12.0a1` drop out.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::version::{LocalVersion, PythonVersion};

static INSTALLABLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\t\n\x0C\r ]*([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?$").unwrap());

static LOCAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([* ]) ([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?(?:/envs/([^ ]+))?(?: \(set by .+\))?$")
        .unwrap()
});

/// A matched `pyenv versions` line, before de-duplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLine {
    pub local: LocalVersion,
    /// Major and minor digits exactly as printed, concatenated (`"3"` + `"9"`).
    pub raw_major_minor: String,
}

/// Parse one `pyenv install --list` line.
pub fn parse_installable_line(line: &str) -> Option<PythonVersion> {
    let caps = INSTALLABLE_LINE.captures(line)?;
    version_from(&caps, 1)
}

/// Parse one `pyenv versions` line.
pub fn parse_local_line(line: &str) -> Option<LocalLine> {
    let caps = LOCAL_LINE.captures(line)?;
    let version = version_from(&caps, 2)?;
    let text = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    Some(LocalLine {
        local: LocalVersion {
            current: text(1) == "*",
            environ: text(5).to_string(),
            version,
        },
        raw_major_minor: format!("{}{}", text(2), text(3)),
    })
}

/// Newest installable version per major line. The first of two equal versions wins.
pub fn installable_latests(output: &str) -> BTreeMap<u64, PythonVersion> {
    let mut latests: BTreeMap<u64, PythonVersion> = BTreeMap::new();
    for line in lines(output) {
        let Some(ver) = parse_installable_line(line) else {
            debug!("skip installable line {line:?}");
            continue;
        };
        match latests.get(&ver.major()) {
            Some(old) if !ver.is_newer_than(old) => {}
            _ => {
                latests.insert(ver.major(), ver);
            }
        }
    }
    latests
}

/// All local runtimes and environments, in listing order.
///
/// Every environment name seen so far (the current line included) is
/// remembered, and a line whose raw major+minor digits equal one of those
/// names is dropped.
pub fn local_versions(output: &str) -> Vec<LocalVersion> {
    let mut envs: HashSet<String> = HashSet::new();
    let mut locals = Vec::new();
    for line in lines(output) {
        let Some(parsed) = parse_local_line(line) else {
            debug!("skip local line {line:?}");
            continue;
        };
        if parsed.local.is_environment() {
            envs.insert(parsed.local.environ.clone());
        }
        if envs.contains(&parsed.raw_major_minor) {
            debug!("skip {line:?}: already listed as environment");
            continue;
        }
        locals.push(parsed.local);
    }
    locals
}

fn lines(output: &str) -> impl Iterator<Item = &str> {
    output
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

// Components that overflow u64 make the whole line a non-match.
fn version_from(caps: &Captures<'_>, first: usize) -> Option<PythonVersion> {
    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(PythonVersion::new(
        part(first)?,
        part(first + 1)?,
        part(first + 2)?,
    ))
}
