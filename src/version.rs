use std::fmt;

use semver::Version;

/// A three-part Python release number as pyenv reports it.
///
/// Missing components are zero, so `3.10` and `3.10.0` are the same value.
/// Ordering is plain (major, minor, patch) comparison; pre-release and build
/// metadata never appear because the parsers only accept bare numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion(Version);

impl PythonVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    /// Strictly newer; equal versions are not newer than each other.
    pub fn is_newer_than(&self, other: &PythonVersion) -> bool {
        self > other
    }
}

/// Canonical form drops trailing zero components: `3`, `3.9`, `3.9.1`.
/// This is also the string handed to `pyenv install` and `pyenv virtualenv`.
impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.0;
        if v.patch > 0 {
            write!(f, "{}.{}.{}", v.major, v.minor, v.patch)
        } else if v.minor > 0 {
            write!(f, "{}.{}", v.major, v.minor)
        } else {
            write!(f, "{}", v.major)
        }
    }
}

/// One line of `pyenv versions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVersion {
    pub current: bool,
    /// Name of the virtualenv bound to `version`; empty for a plain runtime.
    pub environ: String,
    pub version: PythonVersion,
}

impl LocalVersion {
    pub fn is_environment(&self) -> bool {
        !self.environ.is_empty()
    }
}

impl fmt::Display for LocalVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/envs/{}", self.version, self.environ)
    }
}
