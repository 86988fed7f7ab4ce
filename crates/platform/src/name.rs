//! Mapping logical library names to platform file names.

use crate::classify::Os;

/// Strategy for turning a logical library name into a platform file name.
///
/// The default strategy is [`Convention`]; substitute an implementation
/// at loader construction time to exercise non-standard naming (or to
/// pin a fixed name in tests). Implementations must be pure: same input,
/// same output, no side effects.
pub trait NameMapper: Send + Sync {
    /// Map a base name like `sqlite4java` to e.g. `libsqlite4java.so`.
    fn map_library_name(&self, base: &str) -> String;
}

/// File extension used for Mac dynamic libraries.
///
/// `dylib` is the modern convention; `jnilib` survives for payloads built
/// for JVM-adjacent loaders that still expect the legacy extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MacExtension {
    #[default]
    Dylib,
    Jnilib,
}

impl MacExtension {
    fn as_str(self) -> &'static str {
        match self {
            MacExtension::Dylib => "dylib",
            MacExtension::Jnilib => "jnilib",
        }
    }
}

/// The standard per-OS naming convention.
///
/// | OS | prefix | extension |
/// |---|---|---|
/// | Windows | (none) | `dll` |
/// | Linux | `lib` | `so` |
/// | Mac | `lib` | `dylib` (or `jnilib`) |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Convention {
    prefix: &'static str,
    extension: &'static str,
}

impl Convention {
    /// The convention for an OS family, with the default Mac extension.
    #[must_use]
    pub fn for_os(os: Os) -> Self {
        Self::for_os_with(os, MacExtension::default())
    }

    /// The convention for an OS family with an explicit Mac extension.
    /// The extension choice only matters for [`Os::Mac`].
    #[must_use]
    pub fn for_os_with(os: Os, mac_extension: MacExtension) -> Self {
        match os {
            Os::Windows => Self { prefix: "", extension: "dll" },
            Os::Linux => Self { prefix: "lib", extension: "so" },
            Os::Mac => Self { prefix: "lib", extension: mac_extension.as_str() },
        }
    }
}

impl NameMapper for Convention {
    fn map_library_name(&self, base: &str) -> String {
        format!("{}{}.{}", self.prefix, base, self.extension)
    }
}
