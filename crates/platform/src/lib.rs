//! Host platform classification and native library naming.
//!
//! This crate is the pure, I/O-free half of dystage: given the free-form
//! OS and architecture strings a host reports about itself, classify them
//! into the small set of platforms we ship native builds for, and map a
//! logical library name (e.g. `sqlite4java`) to the file name the
//! platform's dynamic linker expects (`sqlite4java.dll`,
//! `libsqlite4java.so`, `libsqlite4java.dylib`).
//!
//! Classification is deliberately fuzzy — substring matching against
//! whatever the host calls itself ("Windows 7", "Mac OS X", "Some linux
//! version") — because that is the contract the identification strings
//! actually offer. Callers that need a hard failure on an unrecognized
//! host get `None` here and raise their own error.

mod classify;
mod host;
mod name;

pub use crate::classify::{Arch, Os};
pub use crate::host::Host;
pub use crate::name::{Convention, MacExtension, NameMapper};
