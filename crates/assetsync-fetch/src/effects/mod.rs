//! I/O for conditional fetching.
//!
//! The network behind [`HttpClient`], the sidecar records in [`StateStore`],
//! and [`ConditionalFetcher`], which ties them to the pure rules in
//! [`crate::core`].

mod fetcher;
mod http;
mod state;

pub use fetcher::ConditionalFetcher;
pub use http::{BoxStream, HttpClient, HttpResponse};
pub use state::{StateSnapshot, StateStore};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
