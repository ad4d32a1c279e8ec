use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{SetupError, SetupResult};

pub const DEFAULT_MOD_LIST_URL: &str =
    "https://raw.githubusercontent.com/max-niederman/fabric-quick-setup/master/fabric_quick_setup/mods.json";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const TIMEOUT_ENV: &str = "FQS_TIMEOUT_SECS";
const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Endpoints and network settings shared by every mod source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SetupConfig {
    pub github_api: String,
    /// Never written back to disk.
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
    pub fabric_meta: String,
    pub jenkins_url: String,
    pub optifine_downloads: String,
    pub mod_list_url: String,
    /// Connect and read timeout. A slow download that keeps receiving data is not cut off.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            github_api: "https://api.github.com".into(),
            github_token: None,
            fabric_meta: "https://meta.fabricmc.net/v2".into(),
            jenkins_url: "https://jenkins.modmuss50.me".into(),
            optifine_downloads: "https://www.optifine.net/downloads".into(),
            mod_list_url: DEFAULT_MOD_LIST_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("FabricQuickSetup/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SetupConfig {
    /// Load settings from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> SetupResult<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| SetupError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!("Loaded settings from {:?}", path);
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };

        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    fn with_env_overrides<F>(mut self, lookup: F) -> SetupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(GITHUB_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.github_token = Some(token);
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                SetupError::Other(format!("{TIMEOUT_ENV} must be a number of seconds, got '{raw}'"))
            })?;
        }

        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
