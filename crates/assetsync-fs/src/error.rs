use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {path}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no space left on device while writing {path}")]
    StorageFull { path: PathBuf },

    #[error("not enough free space for {path}: need {needed} bytes, {available} available")]
    InsufficientSpace {
        path: PathBuf,
        needed: u64,
        available: u64,
    },

    #[error("path has no parent directory: {0}")]
    NoParent(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error was caused by the target filesystem running out of space.
    pub fn is_storage_full(&self) -> bool {
        matches!(self, Self::StorageFull { .. } | Self::InsufficientSpace { .. })
    }
}

pub(crate) fn write_error(path: &Path, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::StorageFull => Error::StorageFull {
            path: path.to_path_buf(),
        },
        _ => Error::Write {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

pub(crate) fn read_error(path: &Path, err: io::Error) -> Error {
    Error::Read {
        path: path.to_path_buf(),
        source: err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enospc_maps_to_storage_full() {
        let err = write_error(Path::new("/www/a.js"), io::Error::from(io::ErrorKind::StorageFull));
        assert!(err.is_storage_full());
        assert!(matches!(err, Error::StorageFull { .. }));
    }

    #[test]
    fn test_other_io_errors_stay_write_errors() {
        let err = write_error(
            Path::new("/www/a.js"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_storage_full());
        assert!(matches!(err, Error::Write { .. }));
    }
}
