use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use assetsync_fs::{AtomicFile, AtomicWriteOptions};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::time::{Instant, timeout_at};

use crate::core::{self as rules, ResponseKind};
use crate::data::{AssetDescriptor, AssetRecord, FetchConfig, MaxAge, UpdateOutcome};
use crate::effects::http::{HttpClient, HttpResponse};
use crate::effects::state::StateStore;
use crate::error::{Error, Result};

/// Verbose diagnostics go to `info`, the rest to `debug`.
macro_rules! diag {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Conditional fetcher for one synchronization pass.
///
/// Owns the configuration and the sidecar records for the pass. Fetches take
/// `&self` and are meant to run one after another; the records sit behind a
/// mutex only so the fetcher can be shared by reference, never across an
/// await point.
pub struct ConditionalFetcher<C: HttpClient> {
    client: C,
    config: FetchConfig,
    state: Mutex<StateStore>,
}

impl<C: HttpClient> ConditionalFetcher<C> {
    pub fn new(client: C, config: FetchConfig, state: StateStore) -> Self {
        Self {
            client,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Snapshot of the persisted record for `local_path`.
    pub fn record(&self, local_path: impl AsRef<Path>) -> Option<AssetRecord> {
        let key = local_path.as_ref().to_string_lossy();
        self.state().get(&key).cloned()
    }

    /// Bring `local_path` up to date with `remote_url`.
    ///
    /// `max_age` uses the [`MaxAge`] grammar; an empty or unusable expression
    /// always allows a network check. `verbose` only affects logging.
    pub async fn fetch(
        &self,
        local_path: impl AsRef<Path>,
        remote_url: &str,
        max_age: &str,
        verbose: bool,
    ) -> UpdateOutcome {
        let asset = AssetDescriptor::new(local_path.as_ref(), remote_url)
            .max_age(MaxAge::parse(max_age))
            .verbose(verbose);
        self.fetch_asset(&asset).await
    }

    /// Descriptor form of [`fetch`](Self::fetch).
    pub async fn fetch_asset(&self, asset: &AssetDescriptor) -> UpdateOutcome {
        match self.try_fetch(asset, Utc::now()).await {
            Ok(outcome) => {
                diag!(
                    asset.verbose,
                    path = %asset.local_path.display(),
                    url = %asset.remote_url,
                    %outcome,
                    "fetch finished"
                );
                outcome
            }
            Err(e) => {
                if asset.verbose {
                    tracing::warn!(
                        path = %asset.local_path.display(),
                        url = %asset.remote_url,
                        error = %e,
                        "fetch failed"
                    );
                } else {
                    tracing::debug!(path = %asset.local_path.display(), error = %e, "fetch failed");
                }
                UpdateOutcome::Failed
            }
        }
    }

    async fn try_fetch(&self, asset: &AssetDescriptor, now: DateTime<Utc>) -> Result<UpdateOutcome> {
        if asset.local_path.as_os_str().is_empty() {
            return Err(Error::InvalidInput("local path is empty"));
        }
        if asset.remote_url.is_empty() {
            return Err(Error::InvalidInput("remote URL is empty"));
        }

        let key = asset.record_key();
        let local_exists = tokio::fs::try_exists(&asset.local_path)
            .await
            .unwrap_or(false);
        let record = if local_exists {
            self.state().get(&key).cloned()
        } else {
            None
        };

        if !rules::is_due(&asset.max_age, record.as_ref(), now) {
            diag!(
                asset.verbose,
                path = %asset.local_path.display(),
                max_age = %asset.max_age,
                "local copy younger than max age, skipping request"
            );
            return Ok(UpdateOutcome::MaxAgeNotReached);
        }

        let headers = rules::request_headers(&self.config.user_agent, record.as_ref(), local_exists);
        let conditional = headers.len() > 1;
        diag!(asset.verbose, url = %asset.remote_url, conditional, "requesting");
        // One deadline covers the response head and the whole body.
        let deadline = Instant::now()
            .checked_add(self.config.timeout)
            .ok_or(Error::InvalidInput("timeout too large"))?;
        let response = timeout_at(deadline, self.client.get(&asset.remote_url, &headers))
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))?
            .map_err(|e| Error::Network(e.to_string()))?;

        match rules::classify_status(response.status) {
            ResponseKind::NotModified if local_exists => {
                self.commit_record(&key, |r| r.last_checked = Some(now)).await;
                Ok(UpdateOutcome::NotModified)
            }
            ResponseKind::NotModified => Err(Error::Status(response.status)),
            ResponseKind::Rejected(status) => Err(Error::Status(status)),
            ResponseKind::Content => self.place_body(asset, &key, response, deadline, now).await,
        }
    }

    async fn place_body(
        &self,
        asset: &AssetDescriptor,
        key: &str,
        response: HttpResponse<C::Error>,
        deadline: Instant,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome> {
        let HttpResponse {
            etag,
            last_modified,
            content_length,
            mut body,
            ..
        } = response;
        let limit = self.config.max_size;

        if let Some(declared) = content_length {
            rules::check_size(limit, declared)?;
        }

        let options = AtomicWriteOptions::new().expected_len(content_length);
        let mut staged = AtomicFile::create(&asset.local_path, options).await?;
        while let Some(chunk) = timeout_at(deadline, body.next())
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))?
        {
            let chunk = chunk.map_err(|e| Error::Network(e.to_string()))?;
            rules::check_size(limit, staged.written() + chunk.len() as u64)?;
            staged.write_chunk(&chunk).await?;
        }
        let written = staged.commit().await?;

        diag!(
            asset.verbose,
            path = %asset.local_path.display(),
            bytes = written,
            etag = etag.as_deref().unwrap_or("-"),
            "placed new content"
        );
        self.commit_record(key, |r| {
            r.last_checked = Some(now);
            r.last_updated = Some(now);
            r.etag = etag;
            r.last_modified = last_modified;
        })
        .await;
        Ok(UpdateOutcome::Updated)
    }

    /// Update and persist one record. The asset itself is already in place,
    /// so a failed save is only logged. The file is written on the blocking
    /// pool after the lock is released.
    async fn commit_record(&self, key: &str, update: impl FnOnce(&mut AssetRecord)) {
        let (path, snapshot) = {
            let mut state = self.state();
            state.update(key, update);
            (state.path().to_path_buf(), state.snapshot())
        };
        let saved = match snapshot {
            Ok(snapshot) => snapshot.write_async().await,
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist fetch state");
        }
    }

    fn state(&self) -> MutexGuard<'_, StateStore> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
