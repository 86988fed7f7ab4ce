//! Staged extraction of embedded payloads onto the filesystem.

use crate::bundle;
use crate::error::{ErrorKind, Result};
use dystage_platform::{Convention, Host, MacExtension, NameMapper, Os};
use rust_embed::Embed;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Extracts one embedded native library to a stable on-disk location and
/// keeps it current.
///
/// A `Loader` owns the staging state for a single logical library name.
/// The first successful [`ensure_loaded`](Self::ensure_loaded) extracts
/// the payload; later calls in the same process return the memoized path
/// without touching storage. Across process runs the staged file is
/// reused as long as its content checksum still matches the embedded
/// source, so an unchanged payload never has its modification timestamp
/// disturbed.
///
/// The bundle type `B` is any [`Embed`] over a folder laid out with one
/// payload per [`ResourceKey`](crate::bundle::ResourceKey) segment.
///
/// # Example
///
/// ```no_run
/// use dystage_loader::Loader;
/// use rust_embed::Embed;
///
/// #[derive(Embed)]
/// #[folder = "testdata/"]
/// struct Native;
///
/// # fn main() -> dystage_loader::error::Result<()> {
/// let loader = Loader::<Native>::new("sqlite4java");
/// let path = loader.ensure_loaded()?;
/// // Hand `path` to the platform's dynamic-library loader.
/// # Ok(())
/// # }
/// ```
pub struct Loader<B: Embed> {
    base_name: String,
    staging_dir: PathBuf,
    mac_extension: MacExtension,
    mapper: Option<Box<dyn NameMapper>>,
    host_source: Box<dyn Fn() -> Host + Send + Sync>,
    staged: Mutex<Option<PathBuf>>,
    bundle: PhantomData<fn() -> B>,
}

impl<B: Embed> Loader<B> {
    /// Create a loader for a logical library name, staging into the
    /// process temp directory and probing the real host.
    #[must_use]
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            staging_dir: std::env::temp_dir(),
            mac_extension: MacExtension::default(),
            mapper: None,
            host_source: Box::new(Host::current),
            staged: Mutex::new(None),
            bundle: PhantomData,
        }
    }

    /// Stage into `dir` instead of the process temp directory. The
    /// directory is created on first extraction if it does not exist;
    /// pass an absolute path so the returned paths are loadable from any
    /// working directory.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Use the legacy `jnilib` extension (or explicitly `dylib`) for Mac
    /// payloads. Has no effect when a custom mapper is set.
    #[must_use]
    pub fn with_mac_extension(mut self, extension: MacExtension) -> Self {
        self.mac_extension = extension;
        self
    }

    /// Substitute the naming strategy wholesale, replacing the per-OS
    /// [`Convention`].
    #[must_use]
    pub fn with_mapper(mut self, mapper: impl NameMapper + 'static) -> Self {
        self.mapper = Some(Box::new(mapper));
        self
    }

    /// Substitute how host identification strings are read. The source is
    /// consulted fresh on every not-yet-loaded attempt, never cached
    /// across [`must_reload`](Self::must_reload).
    #[must_use]
    pub fn with_host_source(mut self, source: impl Fn() -> Host + Send + Sync + 'static) -> Self {
        self.host_source = Box::new(source);
        self
    }

    /// Extract the payload if necessary and return the staged path.
    ///
    /// Idempotent within a process run: once a call succeeds, later calls
    /// return the same path immediately. Concurrent callers serialize on
    /// the internal lock, so exactly one of them extracts and all observe
    /// the same result. On failure no state is memoized and the call may
    /// be retried (worthwhile only when
    /// [`ErrorKind::is_retryable`] says so).
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::UnsupportedHost`] — the host classifies as nothing
    ///   we ship a payload for.
    /// - [`ErrorKind::MissingResource`] — the bundle was packaged without
    ///   the payload this host needs.
    /// - [`ErrorKind::Io`] — the staged copy could not be read or
    ///   written.
    #[instrument(skip(self), fields(library = %self.base_name))]
    pub fn ensure_loaded(&self) -> Result<PathBuf> {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = staged.as_ref() {
            return Ok(path.clone());
        }

        let host = (self.host_source)();
        let file_name = self.file_name(&host)?;
        let source = bundle::resolve::<B>(&host, &file_name)?;
        let target = self.staging_dir.join(&file_name);

        if target.exists() {
            let existing = fs::read(&target).map_err(ErrorKind::Io)?;
            if crc32fast::hash(&existing) == crc32fast::hash(&source) {
                debug!(path = %target.display(), "staged copy is current, skipping write");
                *staged = Some(target.clone());
                return Ok(target);
            }
            debug!(path = %target.display(), "staged copy is stale, rewriting");
        }

        fs::create_dir_all(&self.staging_dir).map_err(ErrorKind::Io)?;
        // Write to a sibling temp file and rename into place, so a racing
        // reader never observes a partially written library.
        let mut tmp = NamedTempFile::new_in(&self.staging_dir).map_err(ErrorKind::Io)?;
        tmp.write_all(&source).map_err(ErrorKind::Io)?;
        tmp.persist(&target).map_err(|e| ErrorKind::Io(e.error))?;
        debug!(path = %target.display(), bytes = source.len(), "extracted native library");

        *staged = Some(target.clone());
        Ok(target)
    }

    /// Forget that extraction succeeded, re-enabling the checksum
    /// comparison on the next [`ensure_loaded`](Self::ensure_loaded).
    /// Useful after the staged file may have been tampered with
    /// externally, and in tests.
    pub fn must_reload(&self) {
        *self.staged.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether extraction has already succeeded this run.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Where the library is (or would be) staged, without extracting.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnsupportedHost`] if no custom mapper is set and the
    /// host's OS string is unrecognized, since the conventional file name
    /// depends on the OS family.
    pub fn staged_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.staged.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(path.clone());
        }
        let host = (self.host_source)();
        Ok(self.staging_dir.join(self.file_name(&host)?))
    }

    fn file_name(&self, host: &Host) -> Result<String> {
        if let Some(mapper) = &self.mapper {
            return Ok(mapper.map_library_name(&self.base_name));
        }
        let Some(os) = Os::classify(&host.os_name) else {
            exn::bail!(ErrorKind::UnsupportedHost {
                os: host.os_name.clone(),
                arch: host.arch.clone(),
            });
        };
        Ok(Convention::for_os_with(os, self.mac_extension).map_library_name(&self.base_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Deref;
    use std::time::{Duration, SystemTime};
    use tempfile::{TempDir, tempdir};

    #[derive(Embed)]
    #[folder = "testdata/"]
    struct Fixture;

    fn windows_loader(dir: &TempDir) -> Loader<Fixture> {
        Loader::new("sqlite4java")
            .with_staging_dir(dir.path())
            .with_host_source(|| Host::new("Windows 7", "amd64"))
    }

    fn source_bytes(path: &str) -> Vec<u8> {
        Fixture::get(path).unwrap().data.into_owned()
    }

    #[test]
    fn extracts_library_on_first_load() {
        let dir = tempdir().unwrap();
        let loader = windows_loader(&dir);

        let expected = loader.staged_path().unwrap();
        assert!(!expected.exists());
        assert!(!loader.is_loaded());

        let path = loader.ensure_loaded().unwrap();
        assert_eq!(path, expected);
        assert_eq!(path.file_name().unwrap(), "sqlite4java.dll");
        assert_eq!(fs::read(&path).unwrap(), source_bytes("windows-x86_64/sqlite4java.dll"));
        assert!(loader.is_loaded());
    }

    #[test]
    fn does_not_rewrite_an_unchanged_library() {
        let dir = tempdir().unwrap();
        let loader = windows_loader(&dir);
        let path = loader.ensure_loaded().unwrap();

        // Pin the modification time far in the past; the filesystem may
        // truncate it, so read back whatever actually stuck.
        let reset = SystemTime::UNIX_EPOCH + Duration::from_secs(1234);
        fs::File::options().write(true).open(&path).unwrap().set_modified(reset).unwrap();
        let pinned = fs::metadata(&path).unwrap().modified().unwrap();

        loader.must_reload();
        loader.ensure_loaded().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), pinned);
    }

    #[test]
    fn rewrites_a_changed_library() {
        let dir = tempdir().unwrap();
        let loader = windows_loader(&dir);
        let path = loader.staged_path().unwrap();
        fs::write(&path, b"changed").unwrap();

        let source = source_bytes("windows-x86_64/sqlite4java.dll");
        assert!(source.len() > b"changed".len());

        loader.ensure_loaded().unwrap();
        assert_eq!(fs::read(&path).unwrap(), source);
    }

    #[test]
    fn memoized_loads_do_not_touch_storage() {
        let dir = tempdir().unwrap();
        let loader = windows_loader(&dir);
        let path = loader.ensure_loaded().unwrap();

        fs::write(&path, b"tampered").unwrap();
        loader.ensure_loaded().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"tampered");

        // Only an explicit reload re-enables the comparison.
        loader.must_reload();
        loader.ensure_loaded().unwrap();
        assert_eq!(fs::read(&path).unwrap(), source_bytes("windows-x86_64/sqlite4java.dll"));
    }

    #[test]
    fn mac_ignores_architecture_and_maps_dylib() {
        let dir = tempdir().unwrap();
        let loader: Loader<Fixture> = Loader::new("sqlite4java")
            .with_staging_dir(dir.path())
            .with_host_source(|| Host::new("Mac OS X", "any architecture"));

        let path = loader.ensure_loaded().unwrap();
        assert_eq!(path.file_name().unwrap(), "libsqlite4java.dylib");
    }

    #[test]
    fn mac_jnilib_extension_is_honored() {
        let dir = tempdir().unwrap();
        let loader: Loader<Fixture> = Loader::new("sqlite4java")
            .with_staging_dir(dir.path())
            .with_mac_extension(MacExtension::Jnilib)
            .with_host_source(|| Host::new("Mac OS X", "any architecture"));

        let path = loader.ensure_loaded().unwrap();
        assert_eq!(path.file_name().unwrap(), "libsqlite4java.jnilib");
    }

    #[test]
    fn unsupported_host_is_fatal_and_leaves_state_unloaded() {
        let dir = tempdir().unwrap();
        let loader: Loader<Fixture> = Loader::new("sqlite4java")
            .with_staging_dir(dir.path())
            .with_host_source(|| Host::new("ACME Electronic", "FooBar2000"));

        let err = loader.ensure_loaded().unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::UnsupportedHost { .. }));
        assert!(!err.is_retryable());
        assert!(!loader.is_loaded());
    }

    #[test]
    fn custom_mapper_replaces_convention() {
        struct Fixed;
        impl NameMapper for Fixed {
            fn map_library_name(&self, base: &str) -> String {
                format!("{base}.bin")
            }
        }

        let dir = tempdir().unwrap();
        let loader: Loader<Fixture> = Loader::new("sqlite4java")
            .with_staging_dir(dir.path())
            .with_mapper(Fixed)
            .with_host_source(|| Host::new("Windows 7", "amd64"));

        // The name maps fine, but no such payload ships in the bundle.
        let err = loader.ensure_loaded().unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::MissingResource(_)));
    }

    #[test]
    fn io_failure_is_retryable_and_leaves_state_unloaded() {
        let dir = tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, b"a file where the staging dir should be").unwrap();

        let loader: Loader<Fixture> = Loader::new("sqlite4java")
            .with_staging_dir(&blocked)
            .with_host_source(|| Host::new("Windows 7", "amd64"));

        let err = loader.ensure_loaded().unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Io(_)));
        assert!(err.is_retryable());
        assert!(!loader.is_loaded());
    }

    #[test]
    fn concurrent_loads_agree_on_one_path() {
        let dir = tempdir().unwrap();
        let loader = windows_loader(&dir);

        let paths: Vec<PathBuf> = std::thread::scope(|scope| {
            let handles: Vec<_> =
                (0..4).map(|_| scope.spawn(|| loader.ensure_loaded().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(paths.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(fs::read(&paths[0]).unwrap(), source_bytes("windows-x86_64/sqlite4java.dll"));
    }

    #[test]
    fn host_source_is_probed_fresh_after_reload() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let dir = tempdir().unwrap();
        let mac = std::sync::Arc::new(AtomicBool::new(false));
        let flag = mac.clone();
        let loader: Loader<Fixture> =
            Loader::new("sqlite4java").with_staging_dir(dir.path()).with_host_source(move || {
                if flag.load(Ordering::SeqCst) {
                    Host::new("Mac OS X", "any architecture")
                } else {
                    Host::new("Windows 7", "amd64")
                }
            });

        let first = loader.ensure_loaded().unwrap();
        assert_eq!(first.file_name().unwrap(), "sqlite4java.dll");

        mac.store(true, Ordering::SeqCst);
        loader.must_reload();
        let second = loader.ensure_loaded().unwrap();
        assert_eq!(second.file_name().unwrap(), "libsqlite4java.dylib");
    }
}
