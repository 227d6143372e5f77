use std::path::Path;

use crate::{Error, Result};

/// Bytes available to unprivileged writers on the filesystem holding `dir`.
///
/// Returns `None` where the platform gives no cheap answer.
#[cfg(unix)]
pub fn available_space(dir: &Path) -> Result<Option<u64>> {
    let stat = nix::sys::statvfs::statvfs(dir).map_err(|errno| Error::Read {
        path: dir.to_path_buf(),
        source: std::io::Error::from(errno),
    })?;
    #[allow(clippy::unnecessary_cast)]
    let available = (stat.blocks_available() as u64).saturating_mul(stat.fragment_size() as u64);
    Ok(Some(available))
}

#[cfg(not(unix))]
pub fn available_space(_dir: &Path) -> Result<Option<u64>> {
    Ok(None)
}

pub fn ensure_available(dir: &Path, needed: u64) -> Result<()> {
    match available_space(dir)? {
        Some(available) if available < needed => {
            tracing::warn!(dir = %dir.display(), needed, available, "not enough free space");
            Err(Error::InsufficientSpace {
                path: dir.to_path_buf(),
                needed,
                available,
            })
        }
        _ => Ok(()),
    }
}
