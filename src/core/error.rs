use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the setup core.
/// Every module returns `Result<T, SetupError>`.
#[derive(Debug, Error)]
pub enum SetupError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Catalog ─────────────────────────────────────────
    #[error("Invalid catalog entry '{id}': {reason}")]
    InvalidEntry { id: String, reason: String },

    #[error("Mod '{0}' is not in the catalog")]
    ModNotFound(String),

    // ── Resolution ──────────────────────────────────────
    #[error("{target} is not available for Minecraft {version}")]
    VersionUnavailable { target: String, version: String },

    #[error("Unexpected response shape: {0}")]
    Structure(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type SetupResult<T> = Result<T, SetupError>;

/// Coarse classification used by the orchestrator to pick a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catalog entry itself is unusable.
    Catalog,
    /// No artifact exists for the requested game version.
    VersionUnavailable,
    /// A remote source answered with something we could not interpret.
    Structural,
    /// Network or filesystem failure.
    Transport,
}

impl SetupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SetupError::InvalidEntry { .. } | SetupError::ModNotFound(_) => ErrorKind::Catalog,
            SetupError::VersionUnavailable { .. } => ErrorKind::VersionUnavailable,
            SetupError::Structure(_) | SetupError::Json(_) => ErrorKind::Structural,
            SetupError::Io { .. }
            | SetupError::Http(_)
            | SetupError::DownloadFailed { .. }
            | SetupError::Other(_) => ErrorKind::Transport,
        }
    }

    pub fn version_unavailable(target: impl Into<String>, version: &str) -> Self {
        SetupError::VersionUnavailable {
            target: target.into(),
            version: version.to_string(),
        }
    }

    pub fn invalid_entry(id: impl Into<String>, reason: impl Into<String>) -> Self {
        SetupError::InvalidEntry {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for SetupError {
    fn from(source: std::io::Error) -> Self {
        SetupError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
