use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::approval::{AlternativeApprover, NeverApprove};
use super::outcome::{InstallReport, ModOutcome, ModStatus, ResolvedMod};
use crate::core::catalog::{Catalog, CatalogEntry, ModResource};
use crate::core::deps;
use crate::core::error::{ErrorKind, SetupError, SetupResult};
use crate::core::sources::ModSource;
use crate::core::target::TargetDir;

/// Bound on `alternative` chains, so cyclic catalog data cannot loop forever.
const MAX_ALTERNATIVE_DEPTH: usize = 8;

/// One batch: which mods, for which game version, into which directory.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub target: TargetDir,
    pub minecraft_version: String,
    pub selected: BTreeSet<String>,
}

/// What a successful install of one entry produced.
struct Installed<'c> {
    entry: &'c CatalogEntry,
    file_name: String,
}

/// Drives a batch of mod installations, one mod at a time, in catalog order.
///
/// Per-mod failures never escape [`Orchestrator::run`]; they end up as
/// outcomes in the returned [`InstallReport`].
pub struct Orchestrator<'a> {
    catalog: &'a Catalog,
    source: &'a dyn ModSource,
    approver: Box<dyn AlternativeApprover + 'a>,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(catalog: &'a Catalog, source: &'a dyn ModSource) -> Self {
        Self {
            catalog,
            source,
            approver: Box::new(NeverApprove),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_approver(mut self, approver: impl AlternativeApprover + 'a) -> Self {
        self.approver = Box::new(approver);
        self
    }

    /// Checked before each mod; a fetch in flight is never interrupted.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Expand the selection and lay it out in installation order:
    /// catalog order first, then ids without a usable entry (sorted).
    pub fn working_set(&self, selected: &BTreeSet<String>) -> Vec<ResolvedMod<'a>> {
        let mut ids = deps::expand(selected, self.catalog);

        let mut mods: Vec<ResolvedMod<'a>> = self
            .catalog
            .entries()
            .iter()
            .filter(|entry| ids.remove(&entry.id))
            .map(|entry| ResolvedMod::new(entry.id.clone(), Some(entry)))
            .collect();

        mods.extend(ids.into_iter().map(|id| ResolvedMod::new(id, None)));
        mods
    }

    pub async fn run(&self, request: &InstallRequest) -> InstallReport {
        let started_at = Utc::now();
        let mut mods = self.working_set(&request.selected);
        let mods_dir = request.target.mods_dir();

        info!(
            "Installing {} mod(s) for Minecraft {} into {:?}",
            mods.len(),
            request.minecraft_version,
            mods_dir
        );

        let mut cancelled = false;
        for resolved in mods.iter_mut() {
            if self.cancel.is_cancelled() {
                warn!("Installation cancelled before {}", resolved.id);
                cancelled = true;
                break;
            }
            self.install_mod(resolved, &mods_dir, &request.minecraft_version)
                .await;
        }

        let outcomes: Vec<ModOutcome> = mods.into_iter().map(ModOutcome::from).collect();
        let report = InstallReport {
            minecraft_version: request.minecraft_version.clone(),
            started_at,
            finished_at: Utc::now(),
            cancelled,
            outcomes,
        };

        info!("Mod installation finished: {}", report.summary());
        report
    }

    /// Run one working-set entry to a terminal status.
    async fn install_mod(&self, resolved: &mut ResolvedMod<'a>, mods_dir: &Path, version: &str) {
        let entry = match resolved.entry {
            Some(entry) => entry,
            None => {
                let error = match self.catalog.lookup(&resolved.id) {
                    Err(e) => e,
                    Ok(_) => SetupError::ModNotFound(resolved.id.clone()),
                };
                warn!("Skipping {}: {}", resolved.id, error);
                resolved.finish(ModStatus::Invalid, error.to_string());
                return;
            }
        };

        info!("Starting mod installation: {}", entry.name);
        let mut warnings = Vec::new();
        let result = self
            .install_entry(entry, mods_dir, version, &mut warnings, 0)
            .await;
        resolved.warnings = warnings;

        match result {
            Ok(installed) => {
                let message = if installed.entry.id == entry.id {
                    format!("Installed {}", installed.file_name)
                } else {
                    format!(
                        "Installed {} in place of {} ({})",
                        installed.entry.name, entry.name, installed.file_name
                    )
                };
                info!("Finished mod installation: {}", installed.entry.name);
                resolved.installed_as = Some(installed.entry.id.clone());
                resolved.file_name = Some(installed.file_name);
                resolved.finish(ModStatus::Installed, message);
            }
            Err(e) => {
                let status = status_for(&e);
                match status {
                    ModStatus::Failed => error!(
                        "An unknown error was encountered while installing {}: {}",
                        entry.name, e
                    ),
                    _ => warn!("{} skipped ({}): {}", entry.name, status, e),
                }
                resolved.finish(status, describe_failure(entry, &e));
            }
        }
    }

    /// Install `entry`, falling back along its alternative chain on a
    /// version miss when the approver agrees.
    fn install_entry<'s>(
        &'s self,
        entry: &'a CatalogEntry,
        mods_dir: &'s Path,
        version: &'s str,
        warnings: &'s mut Vec<String>,
        depth: usize,
    ) -> BoxFuture<'s, SetupResult<Installed<'a>>>
    where
        'a: 's,
    {
        Box::pin(async move {
            let error = match self
                .install_resource(&entry.resource, mods_dir, version, warnings)
                .await
            {
                Ok(file_name) => return Ok(Installed { entry, file_name }),
                Err(e) if e.kind() == ErrorKind::VersionUnavailable => e,
                Err(e) => return Err(e),
            };

            let alternative = match entry.alternative.as_deref() {
                Some(alt) => alt,
                None => return Err(error),
            };

            if depth >= MAX_ALTERNATIVE_DEPTH {
                warn!(
                    "Alternative chain of {} is deeper than {}; giving up",
                    entry.name, MAX_ALTERNATIVE_DEPTH
                );
                return Err(error);
            }

            if !self.approver.approve(entry, alternative, version).await {
                info!("Alternative {} declined for {}", alternative.name, entry.name);
                return Err(error);
            }

            info!(
                "{} is not available for {}; installing {} instead",
                entry.name, version, alternative.name
            );
            self.install_entry(alternative, mods_dir, version, warnings, depth + 1)
                .await
        })
    }

    /// Inline dependencies first (their failures become warnings), then the
    /// resource itself. Returns the file name written into `mods_dir`.
    fn install_resource<'s>(
        &'s self,
        resource: &'a ModResource,
        mods_dir: &'s Path,
        version: &'s str,
        warnings: &'s mut Vec<String>,
    ) -> BoxFuture<'s, SetupResult<String>>
    where
        'a: 's,
    {
        Box::pin(async move {
            for dep in &resource.dependencies {
                match self
                    .install_resource(&dep.resource, mods_dir, version, warnings)
                    .await
                {
                    Ok(file_name) => debug!("Installed dependency {} ({})", dep.name, file_name),
                    Err(e) => {
                        warn!("Dependency {} failed: {}", dep.name, e);
                        warnings.push(format!("Dependency {} failed: {}", dep.name, e));
                    }
                }
            }

            let artifact = self.source.locate(&resource.descriptor, version).await?;
            let dest = mods_dir.join(&artifact.file_name);
            self.source.fetch(&artifact, &dest).await?;
            Ok(artifact.file_name)
        })
    }
}

fn status_for(error: &SetupError) -> ModStatus {
    match error.kind() {
        ErrorKind::VersionUnavailable => ModStatus::VersionUnavailable,
        ErrorKind::Catalog | ErrorKind::Structural => ModStatus::Invalid,
        ErrorKind::Transport => ModStatus::Failed,
    }
}

fn describe_failure(entry: &CatalogEntry, error: &SetupError) -> String {
    match error.kind() {
        ErrorKind::VersionUnavailable => error.to_string(),
        ErrorKind::Catalog => format!("The mod data for {} was invalid: {}", entry.name, error),
        ErrorKind::Structural => format!(
            "The download source for {} returned something unexpected: {}",
            entry.name, error
        ),
        ErrorKind::Transport => format!("Could not install {}: {}", entry.name, error),
    }
}
