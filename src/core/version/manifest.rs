// ─── Game Versions ───
// Fetches the Minecraft version list Fabric Meta knows about (newest first).

use serde::Deserialize;
use tracing::info;

use super::policy::is_stable;
use crate::core::downloader::Downloader;
use crate::core::error::{SetupError, SetupResult};

/// A single entry of `GET /v2/versions/game`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GameVersion {
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

/// Game versions as published by Fabric Meta, newest first.
#[derive(Debug, Clone, Default)]
pub struct GameVersions {
    versions: Vec<GameVersion>,
}

impl GameVersions {
    pub fn new(versions: Vec<GameVersion>) -> Self {
        Self { versions }
    }

    /// Fetch the list from Fabric Meta using the shared downloader.
    pub async fn fetch(downloader: &Downloader, meta_base: &str) -> SetupResult<Self> {
        info!("Fetching Minecraft version list from Fabric Meta...");

        let url = format!("{}/versions/game", meta_base.trim_end_matches('/'));
        let versions: Vec<GameVersion> = downloader.json(downloader.get(&url), &url).await?;

        info!("Loaded {} game versions", versions.len());
        Ok(Self { versions })
    }

    pub fn all(&self) -> &[GameVersion] {
        &self.versions
    }

    /// Version ids in publication order, newest first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(|v| v.version.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.versions.iter().any(|v| v.version == id)
    }

    pub fn latest(&self) -> Option<&str> {
        self.ids().next()
    }

    /// Newest version with a stable release shape.
    pub fn latest_stable(&self) -> Option<&str> {
        self.ids().find(|id| is_stable(id))
    }

    /// Turn a user-supplied version (or the `latest` / `stable` keywords)
    /// into a concrete version id known to Fabric Meta.
    pub fn resolve_requested(&self, requested: &str) -> SetupResult<String> {
        let resolved = match requested.trim() {
            "latest" => self.latest(),
            "stable" => self.latest_stable(),
            other if self.contains(other) => Some(other),
            other => {
                return Err(SetupError::Other(format!(
                    "{other} is not a valid version of Minecraft"
                )))
            }
        };

        resolved.map(str::to_string).ok_or_else(|| {
            SetupError::Structure("Fabric Meta returned no game versions".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(ids: &[&str]) -> GameVersions {
        GameVersions::new(
            ids.iter()
                .map(|id| GameVersion {
                    version: id.to_string(),
                    stable: false,
                })
                .collect(),
        )
    }

    #[test]
    fn deserialize_meta_entry() {
        let json = r#"{ "version": "1.20.4", "stable": true }"#;
        let entry: GameVersion = serde_json::from_str(json).unwrap();
        assert_eq!(entry.version, "1.20.4");
        assert!(entry.stable);
    }

    #[test]
    fn keywords_pick_newest_and_newest_stable() {
        let list = versions(&["24w14a", "1.20.4", "1.20.3"]);
        assert_eq!(list.resolve_requested("latest").unwrap(), "24w14a");
        assert_eq!(list.resolve_requested("stable").unwrap(), "1.20.4");
        assert_eq!(list.resolve_requested("1.20.3").unwrap(), "1.20.3");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let list = versions(&["1.20.4"]);
        let err = list.resolve_requested("1.99").unwrap_err();
        assert!(err.to_string().contains("not a valid version"));
    }

    #[test]
    fn empty_list_has_no_latest() {
        assert!(versions(&[]).resolve_requested("latest").is_err());
    }
}
