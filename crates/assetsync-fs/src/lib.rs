//! Filesystem primitives for a flat mirror directory.
//!
//! - [`atomic_write`] / [`AtomicFile`] replace a file by staging it beside the
//!   target and renaming it over, so readers never see a partial file.
//! - [`list_dir`], [`remove_if_exists`] and [`bare_name`] cover what directory
//!   reconciliation needs.
//! - [`space`] reports free space so a write can fail before touching disk.

mod error;
mod primitives;
pub mod space;

pub use error::{Error, Result};
pub use primitives::{
    AtomicFile, AtomicWriteOptions, Entry, atomic_read, atomic_write, bare_name, list_dir,
    remove_if_exists,
};
