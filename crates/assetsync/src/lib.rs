//! Keep a flat directory of web assets in sync with a remote source.
//!
//! - [`manifest`] - The files a mirror must hold
//! - [`fallback`] - Compressed-first fetching of manifest entries
//! - [`reconcile`] - Removal of files the manifest no longer names
//! - [`pass`] - Full refreshes and periodic checks, one asset at a time
//! - [`config`] - Layered configuration (defaults, TOML, environment)
//!
//! Fetching itself lives in `assetsync-fetch` and atomic placement in
//! `assetsync-fs`; both are re-exported here for convenience.

pub mod config;
mod error;
pub mod fallback;
pub mod manifest;
pub mod pass;
pub mod reconcile;

pub use assetsync_fetch as fetch;
pub use assetsync_fs as fs;

pub use config::{PeriodicAsset, SyncConfig};
pub use error::{Error, Result};
pub use fallback::{FallbackPlan, FallbackRequest, FallbackResult, Variant, fetch_with_fallback};
pub use manifest::Manifest;
pub use pass::{AssetReport, BatchReport, PassReport, Synchronizer};
pub use reconcile::{ReconcileReport, Reconciler};
