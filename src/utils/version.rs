// file: src/utils/version.rs
// description: build information reported by the version command

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub date: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
}

impl VersionInfo {
    /// Commit and date come from `VCS_CONNECT_COMMIT` and
    /// `VCS_CONNECT_BUILD_DATE` when they are set at compile time.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("VCS_CONNECT_COMMIT").unwrap_or("unknown"),
            date: option_env!("VCS_CONNECT_BUILD_DATE").unwrap_or("unknown"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vcs-connect {} (commit {}, built {}, {}/{})",
            self.version, self.commit, self.date, self.os, self.arch
        )
    }
}
