pub mod atomic_write;
pub mod dir;

pub use atomic_write::{AtomicFile, Options as AtomicWriteOptions, atomic_read, atomic_write};
pub use dir::{Entry, bare_name, list_dir, remove_if_exists};
