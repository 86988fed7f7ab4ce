//! OS and architecture classification from free-form host strings.

use derive_more::Display;

/// An operating system family we ship native builds for.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Os {
    #[display("windows")]
    Windows,
    #[display("linux")]
    Linux,
    #[display("mac")]
    Mac,
}

impl Os {
    /// Classify a free-form OS name string.
    ///
    /// Matching is case-insensitive substring containment: "win" means
    /// Windows, "linux" or "nix" means Linux, "mac" means Mac. Anything
    /// else is unrecognized. These exact rules are pinned by downstream
    /// consumers that feed in strings like "Windows XP" or "Mac OS X";
    /// do not tighten them.
    #[must_use]
    pub fn classify(os_name: &str) -> Option<Self> {
        let normalized = os_name.to_lowercase();
        if normalized.contains("win") {
            Some(Os::Windows)
        } else if normalized.contains("linux") || normalized.contains("nix") {
            Some(Os::Linux)
        } else if normalized.contains("mac") {
            Some(Os::Mac)
        } else {
            None
        }
    }
}

/// A processor architecture we ship native builds for.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Arch {
    #[display("x86")]
    X86,
    #[display("x86_64")]
    X86_64,
    /// Architecture-independent: the Mac payload is a universal binary,
    /// so every Mac architecture string maps here.
    #[display("any")]
    Any,
}

impl Arch {
    /// Classify a free-form architecture string for the given OS family.
    ///
    /// On [`Os::Mac`] the architecture string is ignored entirely and the
    /// result is always [`Arch::Any`] — one universal binary serves all
    /// Mac architectures. This asymmetry is intentional, not an oversight.
    ///
    /// Other families require an exact (case-insensitive) alias match:
    /// `x86`/`i386`/`i686` are [`Arch::X86`]; `amd64`/`x86_64`/`x64` are
    /// [`Arch::X86_64`].
    #[must_use]
    pub fn classify(os: Os, arch_name: &str) -> Option<Self> {
        if os == Os::Mac {
            return Some(Arch::Any);
        }
        match arch_name.to_lowercase().as_str() {
            "x86" | "i386" | "i686" => Some(Arch::X86),
            "amd64" | "x86_64" | "x64" => Some(Arch::X86_64),
            _ => None,
        }
    }
}
