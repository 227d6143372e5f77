//! Error types for assetsync-fetch.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("network error: {0}")]
    Network(String),

    #[error("no complete response within {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("payload too large: {received} bytes exceeds limit of {limit}")]
    PayloadTooLarge { received: u64, limit: u64 },

    #[error(transparent)]
    Fs(#[from] assetsync_fs::Error),

    #[error("failed to decode state file {path}")]
    StateDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state")]
    StateEncode(#[source] serde_json::Error),

    #[error("state writer for {path} did not finish")]
    StateWriter {
        path: PathBuf,
        #[source]
        source: tokio::task::JoinError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMaxAgeError {
    #[error("max age `{0}` does not start with a number")]
    MissingAmount(String),

    #[error("max age `{0}` is too large")]
    Overflow(String),

    #[error("unknown time unit `{0}`")]
    UnknownUnit(String),

    #[error("max age of zero")]
    Zero,
}
