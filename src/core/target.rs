use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::error::{SetupError, SetupResult};

/// A game (or server) directory that receives mods under `mods/`.
#[derive(Debug, Clone)]
pub struct TargetDir {
    root: PathBuf,
}

impl TargetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path to the `mods/` directory.
    pub fn mods_dir(&self) -> PathBuf {
        self.root.join("mods")
    }

    /// Create the root and `mods/` if missing.
    pub async fn ensure(&self) -> SetupResult<()> {
        let mods_dir = self.mods_dir();
        tokio::fs::create_dir_all(&mods_dir)
            .await
            .map_err(|source| SetupError::Io {
                path: mods_dir,
                source,
            })
    }

    /// Delete every regular file in `mods/`. Subdirectories are left alone.
    /// A missing `mods/` directory is not an error.
    pub async fn clear_mods(&self) -> SetupResult<usize> {
        let mods_dir = self.mods_dir();
        if !mods_dir.exists() {
            return Ok(0);
        }

        let mut entries = tokio::fs::read_dir(&mods_dir)
            .await
            .map_err(|e| SetupError::Io {
                path: mods_dir.clone(),
                source: e,
            })?;

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| SetupError::Io {
            path: mods_dir.clone(),
            source: e,
        })? {
            let path = entry.path();
            if path.is_file() {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|source| SetupError::Io {
                        path: path.clone(),
                        source,
                    })?;
                debug!("Removed old mod {:?}", path);
                removed += 1;
            }
        }

        info!("Removed {} old mod file(s) from {:?}", removed, mods_dir);
        Ok(removed)
    }
}

/// Default `.minecraft` location for the current OS.
pub fn default_minecraft_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_dir().map(|appdata| appdata.join(".minecraft"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|support| support.join("minecraft"))
    } else {
        dirs::home_dir().map(|home| home.join(".minecraft"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_creates_mods_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let target = TargetDir::new(tmp.path().join("game"));
        target.ensure().await.unwrap();
        assert!(target.mods_dir().is_dir());
    }

    #[tokio::test]
    async fn clear_removes_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        let target = TargetDir::new(tmp.path());
        target.ensure().await.unwrap();
        std::fs::write(target.mods_dir().join("old.jar"), b"x").unwrap();
        std::fs::create_dir(target.mods_dir().join("keep")).unwrap();

        assert_eq!(target.clear_mods().await.unwrap(), 1);
        assert!(!target.mods_dir().join("old.jar").exists());
        assert!(target.mods_dir().join("keep").is_dir());
    }

    #[tokio::test]
    async fn clear_without_mods_dir_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let target = TargetDir::new(tmp.path().join("absent"));
        assert_eq!(target.clear_mods().await.unwrap(), 0);
    }
}
