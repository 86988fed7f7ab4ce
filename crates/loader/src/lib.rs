//! Resolves, extracts, and stages embedded native libraries.
//!
//! Applications that bind to a native engine (a database driver, a codec)
//! cannot hand the dynamic linker a byte slice: the library has to exist
//! as a real file. This crate takes a native shared library embedded into
//! the binary with [`rust-embed`](rust_embed), picks the right payload
//! for the running host, and stages it at a stable filesystem path:
//!
//! - [`bundle::resolve`] classifies the host's OS/architecture strings
//!   and looks up the matching payload, failing distinctly for "no build
//!   for this machine" versus "bundle packaged wrong".
//! - [`Loader`] owns the staged copy: it extracts once per process,
//!   compares content checksums before rewriting so an unchanged payload
//!   keeps its modification timestamp across runs, and serializes
//!   concurrent callers.
//!
//! Naming and classification rules live in [`dystage_platform`], whose
//! types are re-exported here for convenience.

pub mod bundle;
pub mod error;
mod stage;

pub use crate::stage::Loader;
pub use dystage_platform::{Arch, Convention, Host, MacExtension, NameMapper, Os};
