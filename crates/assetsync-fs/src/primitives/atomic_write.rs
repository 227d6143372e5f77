use crate::error::{read_error, write_error};
use crate::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

#[cfg(unix)]
const DEFAULT_PERMISSIONS: Option<u32> = Some(0o644);

#[cfg(not(unix))]
const DEFAULT_PERMISSIONS: Option<u32> = None;

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub permissions: Option<u32>,
    pub sync: bool,
    pub expected_len: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            permissions: DEFAULT_PERMISSIONS,
            sync: true,
            expected_len: None,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
    /// Check free space for `len` bytes before any byte is staged.
    pub fn expected_len(mut self, len: Option<u64>) -> Self {
        self.expected_len = len;
        self
    }
}

/// Directory a staging file for `path` goes in. A bare name lives in the
/// working directory.
fn parent_dir(path: &Path) -> Result<&Path> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(Path::new(".")),
        Some(parent) => Ok(parent),
        None => Err(Error::NoParent(path.to_path_buf())),
    }
}

fn staging_file(path: &Path, options: &Options) -> Result<NamedTempFile> {
    let parent = parent_dir(path)?;
    fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;

    if let Some(needed) = options.expected_len {
        crate::space::ensure_available(parent, needed)?;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!(".{name}.");
    let staging = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(|e| write_error(parent, e))?;

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staging.path(), fs::Permissions::from_mode(mode))
            .map_err(|e| write_error(staging.path(), e))?;
    }

    Ok(staging)
}

fn persist(staging: NamedTempFile, path: &Path, sync: bool) -> Result<()> {
    // A failed persist drops the staging file, which removes it.
    staging.persist(path).map_err(|e| write_error(path, e.error))?;
    if sync {
        sync_parent(path);
    }
    Ok(())
}

#[cfg(unix)]
fn sync_parent(path: &Path) {
    if let Ok(parent) = parent_dir(path)
        && let Ok(dir) = fs::File::open(parent)
    {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}

/// Replace `path` with `content` in one step.
///
/// The bytes are staged next to the target and renamed over it, so readers
/// see either the old file or the new one.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: Options) -> Result<()> {
    let path = path.as_ref();
    let mut staging = staging_file(path, &options)?;

    staging
        .write_all(content)
        .map_err(|e| write_error(staging.path(), e))?;
    if options.sync {
        staging
            .as_file()
            .sync_all()
            .map_err(|e| write_error(staging.path(), e))?;
    }

    persist(staging, path, options.sync)
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| read_error(path, e))
}

/// Streaming counterpart of [`atomic_write`].
///
/// Chunks go to a hidden `.<name>.*.part` file in the target's directory.
/// Nothing becomes visible at the target until [`AtomicFile::commit`];
/// dropping the value without committing deletes the staged bytes and leaves
/// any previous file untouched.
pub struct AtomicFile {
    target: PathBuf,
    staging: NamedTempFile,
    file: tokio::fs::File,
    written: u64,
    sync: bool,
}

impl AtomicFile {
    pub async fn create(target: impl Into<PathBuf>, options: Options) -> Result<Self> {
        let target = target.into();
        let path = target.clone();
        let (staging, file) = tokio::task::spawn_blocking(move || {
            let staging = staging_file(&path, &options)?;
            let file = staging
                .reopen()
                .map_err(|e| write_error(staging.path(), e))?;
            Ok::<_, Error>((staging, file))
        })
        .await
        .map_err(|e| write_error(&target, io::Error::other(e)))??;

        Ok(Self {
            target,
            staging,
            file: tokio::fs::File::from_std(file),
            written: 0,
            sync: options.sync,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| write_error(self.staging.path(), e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    /// Flush, sync and rename the staged file over the target.
    pub async fn commit(self) -> Result<u64> {
        let Self {
            target,
            staging,
            mut file,
            written,
            sync,
        } = self;

        file.flush()
            .await
            .map_err(|e| write_error(staging.path(), e))?;
        if sync {
            file.sync_all()
                .await
                .map_err(|e| write_error(staging.path(), e))?;
        }
        drop(file);

        persist(staging, &target, sync)?;
        tracing::trace!(path = %target.display(), bytes = written, "committed staged file");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn leftover_parts(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".part"))
            .collect()
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"hello world", Options::new()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
        assert!(leftover_parts(dir.path()).is_empty());
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("www").join("style.css");
        atomic_write(&path, b"body{}", Options::new()).unwrap();
        assert_eq!(atomic_read(&path).unwrap(), b"body{}");
    }

    #[test]
    fn test_bare_name_stages_in_working_dir() {
        assert_eq!(parent_dir(Path::new("style.css")).unwrap(), Path::new("."));
        assert_eq!(parent_dir(Path::new("www/style.css")).unwrap(), Path::new("www"));
        assert!(matches!(parent_dir(Path::new("/")), Err(Error::NoParent(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_with_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"data", Options::new().permissions(0o600)).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_default_permissions_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"data", Options::new()).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_atomic_file_commit_replaces_target() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("player.html");
        fs::write(&path, b"old").unwrap();

        let mut file = AtomicFile::create(&path, Options::new()).await.unwrap();
        file.write_chunk(b"<html>").await.unwrap();
        file.write_chunk(b"</html>").await.unwrap();
        assert_eq!(file.written(), 13);
        assert_eq!(fs::read(&path).unwrap(), b"old");

        let written = file.commit().await.unwrap();
        assert_eq!(written, 13);
        assert_eq!(fs::read(&path).unwrap(), b"<html></html>");
        assert!(leftover_parts(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_atomic_file_drop_discards_staging() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("player.html");
        fs::write(&path, b"old").unwrap();

        let mut file = AtomicFile::create(&path, Options::new()).await.unwrap();
        file.write_chunk(b"half of the new").await.unwrap();
        let staging = file.staging_path().to_path_buf();
        assert!(staging.exists());
        drop(file);

        assert!(!staging.exists());
        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert!(leftover_parts(dir.path()).is_empty());
    }
}
