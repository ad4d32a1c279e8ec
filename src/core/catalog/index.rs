use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use super::model::{CatalogEntry, Side};
use super::raw::parse_entry;
use crate::core::downloader::Downloader;
use crate::core::error::{SetupError, SetupResult};

/// An entry that failed validation at load time. Kept so that selecting it
/// reports the reason instead of "not found".
#[derive(Debug, Clone)]
pub struct RejectedEntry {
    pub id: String,
    pub reason: String,
}

/// Read-only, ordered mod catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    rejected: Vec<RejectedEntry>,
}

impl Catalog {
    /// Build a catalog from already-typed entries. Invalid or duplicate
    /// entries are moved to the rejected list.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            match super::validate(&entry) {
                Ok(()) => catalog.push(entry),
                Err(e) => catalog.reject(entry.id.clone(), e),
            }
        }
        catalog
    }

    /// Parse a `mods.json` document (a JSON array of entries).
    pub fn from_json(raw: &str) -> SetupResult<Self> {
        let document: Value = serde_json::from_str(raw)?;
        let items = match document {
            Value::Array(items) => items,
            _ => {
                return Err(SetupError::Structure(
                    "mod list must be a JSON array".into(),
                ))
            }
        };

        let mut catalog = Self::default();
        for (position, item) in items.into_iter().enumerate() {
            match parse_entry(item, position) {
                Ok(entry) => catalog.push(entry),
                Err((id, e)) => catalog.reject(id, e),
            }
        }

        info!(
            "Loaded catalog: {} mods, {} rejected",
            catalog.entries.len(),
            catalog.rejected.len()
        );
        Ok(catalog)
    }

    /// Load from a local file when `source` names one, otherwise fetch it as a URL.
    pub async fn load(source: &str, downloader: &Downloader) -> SetupResult<Self> {
        let path = Path::new(source);
        let raw = if path.is_file() {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| SetupError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?
        } else {
            info!("Fetching mod list from {}", source);
            downloader.text(source).await?
        };

        Self::from_json(&raw)
    }

    fn push(&mut self, entry: CatalogEntry) {
        if self.entries.iter().any(|e| e.id == entry.id)
            || self.rejected.iter().any(|r| r.id == entry.id)
        {
            let id = entry.id.clone();
            self.reject(id.clone(), SetupError::invalid_entry(id, "duplicate mod id"));
            return;
        }
        self.entries.push(entry);
    }

    fn reject(&mut self, id: String, error: SetupError) {
        warn!("Rejected catalog entry '{}': {}", id, error);
        let reason = match error {
            SetupError::InvalidEntry { reason, .. } => reason,
            other => other.to_string(),
        };
        // A duplicate of a rejected id keeps the first reason.
        if self.rejected.iter().any(|r| r.id == id) {
            return;
        }
        self.rejected.push(RejectedEntry { id, reason });
    }

    /// Find an entry by id.
    ///
    /// Returns [`SetupError::InvalidEntry`] for entries rejected at load time
    /// and [`SetupError::ModNotFound`] for ids the catalog never declared.
    pub fn lookup(&self, id: &str) -> SetupResult<&CatalogEntry> {
        if let Some(entry) = self.entries.iter().find(|e| e.id == id) {
            return Ok(entry);
        }
        match self.rejected.iter().find(|r| r.id == id) {
            Some(rejected) => Err(SetupError::invalid_entry(id, rejected.reason.clone())),
            None => Err(SetupError::ModNotFound(id.to_string())),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn rejected(&self) -> &[RejectedEntry] {
        &self.rejected
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_ok()
    }

    /// Entries offered on the given install side.
    pub fn visible(&self, side: Side) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |e| e.visibility.allows(side))
    }

    /// Case-insensitive lookup by display name, for interactive selection.
    pub fn find_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::ResourceDescriptor;

    const MODS_JSON: &str = r#"[
        { "id": "fabric-api", "name": "Fabric API", "resource": { "type": "fabric" },
          "visible": { "client": true, "server": true } },
        { "id": "sodium", "name": "Sodium",
          "resource": { "type": "github", "repo": "CaffeineMC/sodium-fabric", "release": null, "version-agnostic": false },
          "dependencies": ["fabric-api"],
          "alternative": { "id": "optifine", "name": "OptiFine", "resource": { "type": "optifine" } },
          "visible": { "client": true, "server": false } },
        { "id": "broken", "name": "Broken", "resource": {} },
        { "id": "sodium", "name": "Sodium again", "resource": { "url": "https://x/s.jar" } }
    ]"#;

    #[test]
    fn loads_valid_entries_and_keeps_rejections() {
        let catalog = Catalog::from_json(MODS_JSON).unwrap();

        let ids: Vec<_> = catalog.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["fabric-api", "sodium"]);
        assert_eq!(catalog.rejected().len(), 2);

        let sodium = catalog.lookup("sodium").unwrap();
        assert_eq!(sodium.name, "Sodium");
        assert_eq!(sodium.alternative.as_ref().unwrap().id, "optifine");
    }

    #[test]
    fn lookup_distinguishes_rejected_from_unknown() {
        let catalog = Catalog::from_json(MODS_JSON).unwrap();
        assert!(matches!(
            catalog.lookup("broken"),
            Err(SetupError::InvalidEntry { .. })
        ));
        assert!(matches!(
            catalog.lookup("ghost"),
            Err(SetupError::ModNotFound(_))
        ));
    }

    #[test]
    fn visible_filters_by_side() {
        let catalog = Catalog::from_json(MODS_JSON).unwrap();
        let server: Vec<_> = catalog.visible(Side::Server).map(|e| e.id.as_str()).collect();
        assert_eq!(server, vec!["fabric-api"]);
        assert_eq!(catalog.visible(Side::Client).count(), 2);
    }

    #[test]
    fn top_level_must_be_array() {
        assert!(matches!(
            Catalog::from_json(r#"{ "mods": [] }"#),
            Err(SetupError::Structure(_))
        ));
    }

    #[test]
    fn from_entries_rejects_duplicates() {
        let direct = |u: &str| ResourceDescriptor::DirectUrl { url: u.into() };
        let catalog = Catalog::from_entries([
            CatalogEntry::new("a", "A", direct("https://x/a.jar")),
            CatalogEntry::new("a", "A2", direct("https://x/a2.jar")),
        ]);
        assert_eq!(catalog.entries().len(), 1);
        assert_eq!(catalog.lookup("a").unwrap().name, "A");
        assert_eq!(catalog.rejected()[0].reason, "duplicate mod id");
    }

    #[test]
    fn find_by_name_ignores_case() {
        let catalog = Catalog::from_json(MODS_JSON).unwrap();
        assert_eq!(catalog.find_by_name("fabric api").unwrap().id, "fabric-api");
    }
}
