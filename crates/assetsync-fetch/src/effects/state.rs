//! Sidecar file holding one [`AssetRecord`] per local path.
//!
//! The whole map is rewritten atomically on every save. It is small (one
//! entry per mirrored asset) and only the synchronization pass writes it.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::AssetRecord;
use crate::error::{Error, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    records: BTreeMap<String, AssetRecord>,
}

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    records: BTreeMap<String, AssetRecord>,
}

impl StateStore {
    /// Load the store strictly: a corrupt file is an error, a missing one is empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match std::fs::read(&path) {
            Ok(bytes) => {
                let file: StateFile = serde_json::from_slice(&bytes).map_err(|source| {
                    Error::StateDecode {
                        path: path.clone(),
                        source,
                    }
                })?;
                file.records
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Error::Fs(assetsync_fs::Error::Read {
                    path,
                    source: e,
                }));
            }
        };
        Ok(Self { path, records })
    }

    /// Load the store, starting empty if the file cannot be used.
    ///
    /// Losing the records only costs one unconditional download per asset.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable state file");
                Self {
                    path,
                    records: BTreeMap::new(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&AssetRecord> {
        self.records.get(key)
    }

    /// Apply `update` to the record for `key`, creating it if needed.
    pub fn update(&mut self, key: &str, update: impl FnOnce(&mut AssetRecord)) {
        update(self.records.entry(key.to_string()).or_default());
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &AssetRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        self.snapshot()?.write()
    }

    /// Encode the current records for writing once any lock on the store is
    /// released.
    pub fn snapshot(&self) -> Result<StateSnapshot> {
        let file = StateFile {
            records: self.records.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(Error::StateEncode)?;
        Ok(StateSnapshot {
            path: self.path.clone(),
            bytes,
        })
    }
}

/// Encoded state file, detached from its [`StateStore`].
#[derive(Debug)]
pub struct StateSnapshot {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl StateSnapshot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self) -> Result<()> {
        assetsync_fs::atomic_write(&self.path, &self.bytes, assetsync_fs::AtomicWriteOptions::new())?;
        Ok(())
    }

    /// [`write`](Self::write) on the blocking pool.
    pub async fn write_async(self) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || self.write())
            .await
            .map_err(|source| Error::StateWriter { path, source })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = StateStore::load(dir.path().join("state.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let now = Utc::now();

        let mut store = StateStore::load(&path).unwrap();
        store.update("/www/timezones.json.gz", |record| {
            record.etag = Some("\"abc123\"".to_string());
            record.last_checked = Some(now);
            record.last_updated = Some(now);
        });
        store.save().unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        let record = reloaded.get("/www/timezones.json.gz").unwrap();
        assert_eq!(record.etag.as_deref(), Some("\"abc123\""));
        assert_eq!(record.last_updated, Some(now));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(StateStore::load(&path), Err(Error::StateDecode { .. })));
        assert!(StateStore::open(&path).is_empty());
    }

    #[test]
    fn test_update_merges_fields() {
        let dir = tempdir().unwrap();
        let mut store = StateStore::open(dir.path().join("state.json"));
        store.update("a", |r| r.etag = Some("1".into()));
        store.update("a", |r| r.last_modified = Some("x".into()));

        let record = store.get("a").unwrap();
        assert_eq!(record.etag.as_deref(), Some("1"));
        assert_eq!(record.last_modified.as_deref(), Some("x"));
        assert!(store.get("b").is_none());
    }

    #[tokio::test]
    async fn test_snapshot_written_off_the_runtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = StateStore::open(&path);
        store.update("/www/rb_srvrs.json", |r| r.etag = Some("\"7\"".into()));

        let snapshot = store.snapshot().unwrap();
        store.update("/www/rb_srvrs.json", |r| r.etag = Some("\"8\"".into()));
        assert_eq!(snapshot.path(), path);
        snapshot.write_async().await.unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        assert_eq!(
            reloaded.get("/www/rb_srvrs.json").unwrap().etag.as_deref(),
            Some("\"7\"")
        );
    }
}
