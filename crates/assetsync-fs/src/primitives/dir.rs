use crate::error::read_error;
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One entry of a flat directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_file: bool,
}

/// List the immediate children of `dir`, sorted by name.
///
/// A missing directory lists as empty. Names that are not valid UTF-8 are
/// reported lossily.
pub fn list_dir(dir: impl AsRef<Path>) -> Result<Vec<Entry>> {
    let dir = dir.as_ref();
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_error(dir, e)),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| read_error(dir, e))?;
        let file_type = entry.file_type().map_err(|e| read_error(&entry.path(), e))?;
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            is_file: !file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Remove a file, treating an already-missing file as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Final component of a `/`-separated path, as listed by flash filesystems
/// that report full paths instead of names.
pub fn bare_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_dir_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b"), b"").unwrap();
        fs::write(dir.path().join("a.gz"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let entries = list_dir(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.gz", "b", "sub"]);
        assert!(entries[0].is_file);
        assert!(!entries[2].is_file);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(list_dir(dir.path().join("www")).unwrap().is_empty());
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stray.txt");
        fs::write(&path, b"x").unwrap();

        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
        assert!(!remove_if_exists(&path).unwrap());
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("/www/style.css"), "style.css");
        assert_eq!(bare_name("style.css"), "style.css");
        assert_eq!(bare_name("www/"), "");
    }
}
