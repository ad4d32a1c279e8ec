use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::catalog::CatalogEntry;

/// Lifecycle of one mod within a run. Everything but `Pending` is terminal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModStatus {
    Pending,
    Installed,
    VersionUnavailable,
    Invalid,
    Failed,
}

impl std::fmt::Display for ModStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModStatus::Pending => write!(f, "pending"),
            ModStatus::Installed => write!(f, "installed"),
            ModStatus::VersionUnavailable => write!(f, "version unavailable"),
            ModStatus::Invalid => write!(f, "invalid"),
            ModStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Working-set entry: one requested mod id and what has happened to it so far.
#[derive(Debug, Clone)]
pub struct ResolvedMod<'c> {
    pub id: String,
    /// `None` when the id could not be looked up in the catalog.
    pub entry: Option<&'c CatalogEntry>,
    pub status: ModStatus,
    /// Id of the entry that was actually installed (differs after a fallback).
    pub installed_as: Option<String>,
    pub file_name: Option<String>,
    pub message: Option<String>,
    /// Non-fatal problems, e.g. an inline dependency that failed.
    pub warnings: Vec<String>,
}

impl<'c> ResolvedMod<'c> {
    pub fn new(id: impl Into<String>, entry: Option<&'c CatalogEntry>) -> Self {
        Self {
            id: id.into(),
            entry,
            status: ModStatus::Pending,
            installed_as: None,
            file_name: None,
            message: None,
            warnings: Vec::new(),
        }
    }

    pub fn finish(&mut self, status: ModStatus, message: impl Into<String>) {
        self.status = status;
        self.message = Some(message.into());
    }
}

/// Per-mod result handed back to the caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModOutcome {
    /// The mod the status is attributed to: the alternative's id after a fallback.
    pub mod_id: String,
    /// The id that was part of the working set.
    pub requested_id: String,
    pub status: ModStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<ResolvedMod<'_>> for ModOutcome {
    fn from(resolved: ResolvedMod<'_>) -> Self {
        let message = resolved
            .message
            .unwrap_or_else(|| "not attempted: run cancelled".to_string());
        Self {
            mod_id: resolved.installed_as.unwrap_or_else(|| resolved.id.clone()),
            requested_id: resolved.id,
            status: resolved.status,
            message,
            file_name: resolved.file_name,
            warnings: resolved.warnings,
        }
    }
}

/// Skipped mods broken down by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub version_unavailable: usize,
    pub invalid: usize,
    pub failed: usize,
    pub not_attempted: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.version_unavailable + self.invalid + self.failed + self.not_attempted
    }
}

/// Everything a batch run produced. Always complete, even if every mod failed.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub minecraft_version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub outcomes: Vec<ModOutcome>,
}

impl InstallReport {
    pub fn installed_count(&self) -> usize {
        self.with_status(ModStatus::Installed).count()
    }

    pub fn skipped(&self) -> SkipCounts {
        let mut counts = SkipCounts::default();
        for outcome in &self.outcomes {
            match outcome.status {
                ModStatus::Installed => {}
                ModStatus::VersionUnavailable => counts.version_unavailable += 1,
                ModStatus::Invalid => counts.invalid += 1,
                ModStatus::Failed => counts.failed += 1,
                ModStatus::Pending => counts.not_attempted += 1,
            }
        }
        counts
    }

    pub fn with_status(&self, status: ModStatus) -> impl Iterator<Item = &ModOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }

    pub fn not_installed(&self) -> impl Iterator<Item = &ModOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status != ModStatus::Installed)
    }

    pub fn summary(&self) -> String {
        let skipped = self.skipped();
        let mut line = format!(
            "{} installed, {} skipped for Minecraft {}",
            self.installed_count(),
            skipped.total(),
            self.minecraft_version
        );
        if skipped.total() > 0 {
            line.push_str(&format!(
                " ({} unavailable, {} invalid, {} failed, {} not attempted)",
                skipped.version_unavailable, skipped.invalid, skipped.failed, skipped.not_attempted
            ));
        }
        if self.cancelled {
            line.push_str(" [cancelled]");
        }
        line
    }
}
