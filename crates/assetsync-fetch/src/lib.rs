//! Conditional HTTP fetching for a local asset mirror.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration, outcomes and persisted records
//! - [`core`] - Pure decisions (staleness, conditional headers, status classes)
//! - [`effects`] - Network, sidecar state and the fetcher itself
//!
//! # Key Features
//!
//! - **Throttled**: a caller-supplied max age skips the network entirely
//! - **Conditional**: `ETag` / `Last-Modified` turn unchanged assets into a `304`
//! - **Capped**: bodies over the configured size never reach the disk
//! - **Atomic Placement**: uses `assetsync-fs::AtomicFile`, so a failed
//!   download leaves the previous file in place

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{ResponseKind, classify_status, is_due, request_headers};
pub use data::{AssetDescriptor, AssetRecord, DEFAULT_USER_AGENT, FetchConfig, MaxAge, UpdateOutcome};
pub use effects::{
    BoxStream, ConditionalFetcher, HttpClient, HttpResponse, StateSnapshot, StateStore,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{Error, ParseMaxAgeError, Result};
