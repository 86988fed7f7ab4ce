//! Embedded resource bundle lookup.
//!
//! Native payloads are embedded into the binary at compile time using
//! [`rust-embed`](rust_embed), one payload per supported platform under a
//! path segment derived from the classified host (`windows-x86_64/...`,
//! `mac/...`, and so on). The bundle type itself is supplied by the
//! embedder as a type parameter, so this crate never dictates where the
//! payload folder lives in the consumer's tree.

use crate::error::{ErrorKind, Result};
use dystage_platform::{Arch, Host, Os};
use exn::OptionExt;
use rust_embed::Embed;
use std::borrow::Cow;

/// Which embedded payload serves a classified host.
///
/// One variant per payload shipped in the bundle. Mac is a single
/// universal binary, so it has no per-architecture variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    WindowsX86,
    WindowsX64,
    LinuxX86,
    LinuxX64,
    Mac,
}

impl ResourceKey {
    /// Classify a host and select its payload, or `None` if either
    /// identification string is unrecognized.
    #[must_use]
    pub fn for_host(host: &Host) -> Option<Self> {
        let (os, arch) = host.classify()?;
        Self::from_tags(os, arch)
    }

    fn from_tags(os: Os, arch: Arch) -> Option<Self> {
        match (os, arch) {
            (Os::Mac, _) => Some(Self::Mac),
            (Os::Windows, Arch::X86) => Some(Self::WindowsX86),
            (Os::Windows, Arch::X86_64) => Some(Self::WindowsX64),
            (Os::Linux, Arch::X86) => Some(Self::LinuxX86),
            (Os::Linux, Arch::X86_64) => Some(Self::LinuxX64),
            // Classification only produces `Any` for Mac.
            (Os::Windows | Os::Linux, Arch::Any) => None,
        }
    }

    /// The bundle path segment holding this payload.
    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Self::WindowsX86 => "windows-x86",
            Self::WindowsX64 => "windows-x86_64",
            Self::LinuxX86 => "linux-x86",
            Self::LinuxX64 => "linux-x86_64",
            Self::Mac => "mac",
        }
    }
}

/// Resolve the embedded payload bytes for a host.
///
/// # Errors
///
/// - [`ErrorKind::UnsupportedHost`] if the host's OS or architecture
///   string is unrecognized — there is no payload for this machine.
/// - [`ErrorKind::MissingResource`] if the host classified fine but the
///   bundle lacks `segment/file_name`, which means the bundle was
///   packaged incorrectly.
pub fn resolve<B: Embed>(host: &Host, file_name: &str) -> Result<Cow<'static, [u8]>> {
    let Some(key) = ResourceKey::for_host(host) else {
        exn::bail!(ErrorKind::UnsupportedHost {
            os: host.os_name.clone(),
            arch: host.arch.clone(),
        });
    };
    let path = format!("{}/{}", key.segment(), file_name);
    B::get(&path).map(|f| f.data).ok_or_raise(|| ErrorKind::MissingResource(path))
}
