//! Host identification strings.

use crate::classify::{Arch, Os};

/// The pair of free-form strings a host reports about itself.
///
/// The default pair comes from [`Host::current`], but the struct is plain
/// data on purpose: tests (and unusual embedders) construct arbitrary
/// hosts and observe different resolution outcomes without touching any
/// global state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    /// Free-form OS name, e.g. "Windows 7" or "macos".
    pub os_name: String,
    /// Free-form architecture name, e.g. "amd64" or "x86_64".
    pub arch: String,
}

impl Host {
    pub fn new(os_name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self { os_name: os_name.into(), arch: arch.into() }
    }

    /// The host this process is running on, read from
    /// [`std::env::consts`]. The constants ("windows", "linux", "macos",
    /// "x86_64", ...) all classify cleanly under the substring rules.
    #[must_use]
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Classify both identification strings at once.
    ///
    /// Returns `None` if either string is unrecognized. Architecture
    /// classification sees the already-classified OS so the Mac
    /// universal-binary rule applies.
    #[must_use]
    pub fn classify(&self) -> Option<(Os, Arch)> {
        let os = Os::classify(&self.os_name)?;
        let arch = Arch::classify(os, &self.arch)?;
        Some((os, arch))
    }
}
