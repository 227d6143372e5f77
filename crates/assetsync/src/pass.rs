//! Synchronization passes over a whole mirror.
//!
//! A [`Synchronizer`] owns its configuration and HTTP client. Each pass builds
//! a fresh [`ConditionalFetcher`] over the persisted sidecar records, walks its
//! assets strictly one at a time, and reports per-asset outcomes. A failed
//! asset never stops the pass. Passes on the same synchronizer are serialized.

use std::path::Path;
use std::sync::Arc;

use assetsync_fetch::{
    AssetDescriptor, ConditionalFetcher, HttpClient, MaxAge, StateStore, UpdateOutcome,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::fallback::{FallbackRequest, Variant, fetch_with_fallback};
use crate::manifest::Manifest;
use crate::reconcile::{ReconcileReport, Reconciler};

/// Outcome of one asset within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub name: String,
    pub outcome: UpdateOutcome,
    /// Variant that settled the asset, for manifest entries.
    pub variant: Option<Variant>,
    pub attempts: u8,
}

/// Per-asset outcomes of one batch plus, for a full refresh, what the
/// reconciler did afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub assets: Vec<AssetReport>,
    pub reconcile: Option<ReconcileReport>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.assets.iter().filter(|a| a.outcome.is_failed()).count()
    }

    /// True only for a non-empty batch in which every asset failed.
    pub fn all_failed(&self) -> bool {
        !self.assets.is_empty() && self.failed_count() == self.assets.len()
    }

    pub fn any_updated(&self) -> bool {
        self.assets
            .iter()
            .any(|a| a.outcome == UpdateOutcome::Updated)
    }

    pub fn outcome(&self, name: &str) -> Option<UpdateOutcome> {
        self.assets
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.outcome)
    }
}

/// Result of [`Synchronizer::run`].
///
/// Whether to restart after a refresh is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// A full refresh was requested and ran.
    pub refreshed: bool,
    pub refresh: Option<BatchReport>,
    pub periodic: BatchReport,
}

impl PassReport {
    pub fn any_updated(&self) -> bool {
        self.periodic.any_updated() || self.refresh.as_ref().is_some_and(BatchReport::any_updated)
    }

    /// True when at least one asset was attempted and every attempt failed.
    pub fn all_failed(&self) -> bool {
        let batches: Vec<&BatchReport> = self
            .refresh
            .iter()
            .chain(Some(&self.periodic))
            .filter(|batch| !batch.assets.is_empty())
            .collect();
        !batches.is_empty() && batches.iter().all(|batch| batch.all_failed())
    }
}

pub struct Synchronizer<C: HttpClient> {
    config: Arc<SyncConfig>,
    manifest: Manifest,
    client: Arc<C>,
    gate: Mutex<()>,
}

impl<C: HttpClient + 'static> Synchronizer<C> {
    /// Validate `config` and take ownership of it.
    pub fn new(config: SyncConfig, client: C) -> Result<Self> {
        Self::with_client(config, Arc::new(client))
    }

    pub fn with_client(config: SyncConfig, client: Arc<C>) -> Result<Self> {
        config.validate()?;
        let manifest = config.manifest()?;
        Ok(Self {
            config: Arc::new(config),
            manifest,
            client,
            gate: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Fetch every manifest entry unconditionally, then reconcile the mirror.
    pub async fn full_refresh(&self) -> BatchReport {
        let _pass = self.gate.lock().await;
        self.refresh_locked().await
    }

    /// Check every periodic asset against its own max age.
    pub async fn refresh_assets(&self) -> BatchReport {
        let _pass = self.gate.lock().await;
        self.periodic_locked().await
    }

    /// One scheduled pass.
    ///
    /// A full refresh runs first if the marker file exists or the mirror holds
    /// none of the manifest's files; the marker is removed once the refresh
    /// has run. Periodic assets are checked afterwards in every case.
    pub async fn run(&self) -> PassReport {
        let _pass = self.gate.lock().await;

        let refresh = if self.refresh_requested().await {
            let report = self.refresh_locked().await;
            if let Some(marker) = &self.config.marker_file {
                match assetsync_fs::remove_if_exists(marker) {
                    Ok(_) => tracing::debug!(path = %marker.display(), "cleared refresh marker"),
                    Err(e) => tracing::warn!(path = %marker.display(), error = %e, "failed to clear refresh marker"),
                }
            }
            Some(report)
        } else {
            None
        };
        let periodic = self.periodic_locked().await;

        PassReport {
            refreshed: refresh.is_some(),
            refresh,
            periodic,
        }
    }

    /// Run [`run`](Self::run) on a Tokio task.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<PassReport> {
        tokio::spawn(async move { self.run().await })
    }

    /// One conditional fetch outside any batch.
    pub async fn fetch_one(&self, asset: &AssetDescriptor) -> UpdateOutcome {
        let _pass = self.gate.lock().await;
        self.fetcher().fetch_asset(asset).await
    }

    /// Reconcile the mirror without fetching anything.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let _pass = self.gate.lock().await;
        Reconciler::new(&self.manifest).apply(&self.config.mirror_root)
    }

    fn fetcher(&self) -> ConditionalFetcher<Arc<C>> {
        let state = StateStore::open(self.config.state_path());
        ConditionalFetcher::new(Arc::clone(&self.client), self.config.fetch_config(), state)
    }

    async fn refresh_requested(&self) -> bool {
        if let Some(marker) = &self.config.marker_file {
            if tokio::fs::try_exists(marker).await.unwrap_or(false) {
                tracing::info!(path = %marker.display(), "refresh marker present");
                return true;
            }
        }
        if !self.manifest.is_empty() && mirror_is_empty(&self.config.mirror_root, &self.manifest) {
            tracing::info!(path = %self.config.mirror_root.display(), "mirror is empty");
            return true;
        }
        false
    }

    async fn refresh_locked(&self) -> BatchReport {
        let config = &self.config;
        let fetcher = self.fetcher();
        let max_age = MaxAge::Always;
        let mut report = BatchReport::default();

        tracing::info!(entries = self.manifest.len(), "starting full refresh");
        for name in self.manifest.iter() {
            let request = FallbackRequest {
                root: &config.mirror_root,
                base_url: &config.base_url,
                name,
                max_age: &max_age,
                compressed_first: config.compressed_fallback,
                verbose: config.verbose,
            };
            let result = fetch_with_fallback(&fetcher, &request).await;
            report.assets.push(AssetReport {
                name: name.to_string(),
                outcome: result.outcome,
                variant: Some(result.variant),
                attempts: result.attempts,
            });
        }

        match Reconciler::new(&self.manifest).apply(&config.mirror_root) {
            Ok(reconciled) => report.reconcile = Some(reconciled),
            Err(e) => tracing::error!(path = %config.mirror_root.display(), error = %e, "reconciliation failed"),
        }

        tracing::info!(
            total = report.assets.len(),
            failed = report.failed_count(),
            "full refresh finished"
        );
        report
    }

    async fn periodic_locked(&self) -> BatchReport {
        let config = &self.config;
        let fetcher = self.fetcher();
        let mut report = BatchReport::default();

        for asset in &config.assets {
            tracing::info!(asset = %asset.label, "started update");
            let descriptor = AssetDescriptor::new(config.local_path(&asset.local_name), asset.url.as_str())
                .max_age(SyncConfig::max_age(asset))
                .verbose(config.verbose);
            let outcome = fetcher.fetch_asset(&descriptor).await;
            match outcome {
                UpdateOutcome::Updated => tracing::info!(asset = %asset.label, "update completed"),
                UpdateOutcome::NotModified | UpdateOutcome::MaxAgeNotReached => {
                    tracing::info!(asset = %asset.label, %outcome, "no update needed")
                }
                UpdateOutcome::Failed => tracing::warn!(asset = %asset.label, "update failed"),
            }
            report.assets.push(AssetReport {
                name: asset.label.clone(),
                outcome,
                variant: None,
                attempts: 1,
            });
        }
        report
    }
}

/// None of the manifest's files, in either form, is present.
fn mirror_is_empty(root: &Path, manifest: &Manifest) -> bool {
    match assetsync_fs::list_dir(root) {
        Ok(entries) => !entries
            .iter()
            .any(|entry| entry.is_file && manifest.allows(&entry.name)),
        Err(e) => {
            tracing::warn!(path = %root.display(), error = %e, "failed to list mirror");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, outcome: UpdateOutcome) -> AssetReport {
        AssetReport {
            name: name.to_string(),
            outcome,
            variant: None,
            attempts: 1,
        }
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport {
            assets: vec![
                asset("a", UpdateOutcome::Updated),
                asset("b", UpdateOutcome::Failed),
                asset("c", UpdateOutcome::NotModified),
            ],
            reconcile: None,
        };
        assert_eq!(report.failed_count(), 1);
        assert!(!report.all_failed());
        assert!(report.any_updated());
        assert_eq!(report.outcome("b"), Some(UpdateOutcome::Failed));
        assert_eq!(report.outcome("z"), None);
    }

    #[test]
    fn test_empty_batch_is_not_all_failed() {
        assert!(!BatchReport::default().all_failed());
        assert!(!PassReport::default().all_failed());
    }

    #[test]
    fn test_pass_report_all_failed() {
        let failed = BatchReport {
            assets: vec![asset("a", UpdateOutcome::Failed)],
            reconcile: None,
        };
        let report = PassReport {
            refreshed: true,
            refresh: Some(failed.clone()),
            periodic: failed.clone(),
        };
        assert!(report.all_failed());

        let report = PassReport {
            refreshed: false,
            refresh: None,
            periodic: BatchReport {
                assets: vec![asset("tz", UpdateOutcome::MaxAgeNotReached)],
                reconcile: None,
            },
        };
        assert!(!report.all_failed());
        assert!(!report.any_updated());
    }
}
