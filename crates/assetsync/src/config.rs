use std::path::{Path, PathBuf};
use std::time::Duration;

use assetsync_fetch::{DEFAULT_USER_AGENT, FetchConfig, MaxAge};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manifest::Manifest;

pub const DEFAULT_CONFIG_FILE: &str = "assetsync.toml";
pub const ENV_PREFIX: &str = "ASSETSYNC_";
pub const STATE_FILE_NAME: &str = ".assetsync-state.json";

/// A single file kept fresh on its own schedule, outside the full refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicAsset {
    /// Human-readable name used in log lines.
    pub label: String,
    /// File name under the mirror root.
    pub local_name: String,
    pub url: String,
    /// Duration expression, e.g. `"1 week"`. Empty means check every pass.
    #[serde(default)]
    pub max_age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub mirror_root: PathBuf,
    /// Sidecar record file. Defaults to a hidden file next to the mirror root.
    pub state_path: Option<PathBuf>,
    /// Prefix the manifest entries are fetched from.
    pub base_url: String,
    pub max_size: Option<u64>,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub verbose: bool,
    /// Presence of this file requests a full refresh on the next pass.
    pub marker_file: Option<PathBuf>,
    /// Try `<name>.gz` before `<name>` for manifest entries.
    pub compressed_fallback: bool,
    pub manifest: Vec<String>,
    pub assets: Vec<PeriodicAsset>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mirror_root: PathBuf::from("www"),
            state_path: None,
            base_url: String::new(),
            max_size: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            verbose: false,
            marker_file: None,
            compressed_fallback: true,
            manifest: Vec::new(),
            assets: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Merge defaults, the TOML file and `ASSETSYNC_*` environment variables.
    ///
    /// Without an explicit `path`, `assetsync.toml` in the working directory is
    /// used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        if path.is_some() && !file.exists() {
            return Err(Error::Invalid(format!(
                "config file {} does not exist",
                file.display()
            )));
        }

        Self::figment(file).extract::<Self>()?.validated()
    }

    pub fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(SyncConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.manifest()?;

        if self.mirror_root.as_os_str().is_empty() {
            return Err(Error::Invalid("mirror_root is empty".into()));
        }
        if !self.manifest.is_empty() && self.base_url.is_empty() {
            return Err(Error::Invalid("base_url is required when a manifest is set".into()));
        }
        if self.max_size == Some(0) {
            return Err(Error::Invalid("max_size must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Invalid("timeout_secs must be positive".into()));
        }

        // The reconciler would delete a state file kept inside the mirror.
        let state = self.state_path();
        if state.parent().is_some_and(|dir| same_dir(dir, &self.mirror_root)) {
            return Err(Error::Invalid(format!(
                "state file {} must live outside mirror_root",
                state.display()
            )));
        }

        for asset in &self.assets {
            if asset.url.is_empty() {
                return Err(Error::Invalid(format!("asset `{}` has no url", asset.label)));
            }
            Manifest::new([asset.local_name.as_str()])?;
        }
        Ok(())
    }

    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::new(self.manifest.iter().cloned())
    }

    pub fn state_path(&self) -> PathBuf {
        match &self.state_path {
            Some(path) => path.clone(),
            None => self
                .mirror_root
                .parent()
                .unwrap_or(Path::new(""))
                .join(STATE_FILE_NAME),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .max_size(self.max_size)
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout())
    }

    pub fn local_path(&self, name: &str) -> PathBuf {
        self.mirror_root.join(name)
    }

    pub fn max_age(asset: &PeriodicAsset) -> MaxAge {
        MaxAge::parse(&asset.max_age)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => normalize(a) == normalize(b),
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
