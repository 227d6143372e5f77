use std::path::PathBuf;
use std::time::Duration;

use super::max_age::MaxAge;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("assetsync/", env!("CARGO_PKG_VERSION"));

/// Configuration shared by every fetch in one synchronization pass.
///
/// # Examples
///
/// ```
/// use assetsync_fetch::FetchConfig;
/// use std::time::Duration;
///
/// let config = FetchConfig::default()
///     .max_size(Some(512 * 1024))
///     .user_agent("radio/2.1")
///     .timeout(Duration::from_secs(10));
/// assert_eq!(config.max_size, Some(512 * 1024));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Largest body accepted, in bytes.
    ///
    /// Checked against `Content-Length` before anything is staged and again
    /// while streaming, since the header may be absent or wrong.
    ///
    /// Default: `None` (uncapped)
    pub max_size: Option<u64>,

    /// `User-Agent` header value.
    ///
    /// Default: `assetsync/<version>`
    pub user_agent: String,

    /// Deadline for one fetch, from sending the request to the last body
    /// chunk. A fetch that runs past it fails and keeps the previous file.
    ///
    /// Default: 30s
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_size: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub fn max_size(mut self, max_size: Option<u64>) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Everything one fetch call needs to know about one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub local_path: PathBuf,
    pub remote_url: String,
    pub max_age: MaxAge,
    /// Report diagnostics at `info` instead of `debug`. Never changes the outcome.
    pub verbose: bool,
}

impl AssetDescriptor {
    pub fn new(local_path: impl Into<PathBuf>, remote_url: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_url: remote_url.into(),
            max_age: MaxAge::Always,
            verbose: false,
        }
    }

    #[must_use]
    pub fn max_age(mut self, max_age: MaxAge) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Key used for the persisted record of this asset.
    pub fn record_key(&self) -> String {
        self.local_path.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.max_size, None);
        assert!(config.user_agent.starts_with("assetsync/"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_descriptor_builder() {
        let asset = AssetDescriptor::new("/www/rb_srvrs.json", "https://example.com/rb_srvrs.json")
            .max_age(MaxAge::parse("4 weeks"))
            .verbose(true);
        assert_eq!(asset.record_key(), "/www/rb_srvrs.json");
        assert_eq!(asset.max_age.duration(), Some(Duration::from_secs(4 * 7 * 86_400)));
        assert!(asset.verbose);
    }
}
