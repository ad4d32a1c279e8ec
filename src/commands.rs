use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::catalog::{Catalog, CatalogEntry, Side};
use crate::core::config::SetupConfig;
use crate::core::downloader::Downloader;
use crate::core::error::{SetupError, SetupResult};
use crate::core::http::build_http_client;
use crate::core::install::{
    AlternativeApprover, AlwaysApprove, InstallReport, InstallRequest, ModStatus, NeverApprove,
    Orchestrator,
};
use crate::core::sources::SourceResolver;
use crate::core::target::{default_minecraft_dir, TargetDir};
use crate::core::version::GameVersions;

#[derive(Debug, Parser)]
#[command(name = "fabric-quick-setup", version, about = "Install curated Fabric mods for a Minecraft version")]
pub struct Cli {
    /// Settings file (JSON) with endpoint and timeout overrides
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Mod list to use instead of the published one (file path or URL)
    #[arg(long, global = true)]
    pub mod_list: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install mods into a game directory
    Install(InstallArgs),
    /// List mods available in the mod list
    List {
        /// Only show mods offered for servers
        #[arg(long)]
        server: bool,
    },
    /// List Minecraft versions known to Fabric
    Versions {
        /// Only show stable versions
        #[arg(long)]
        stable: bool,
    },
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Game directory; defaults to the platform's .minecraft
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Minecraft version, or `latest` / `stable`
    #[arg(short = 'g', long = "mc-version", default_value = "latest")]
    pub mc_version: String,

    /// Mod ids or names to install; prompts when omitted
    #[arg(short, long = "mod")]
    pub mods: Vec<String>,

    /// Install server-side mods only
    #[arg(long)]
    pub server: bool,

    /// Accept every suggested alternative without asking
    #[arg(short, long, conflicts_with = "no_alternatives")]
    pub yes: bool,

    /// Never fall back to alternatives
    #[arg(long)]
    pub no_alternatives: bool,

    /// Keep files already in the mods folder
    #[arg(long)]
    pub keep_mods: bool,

    /// Write the installation report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

// ── Dispatch ────────────────────────────────────────────

pub async fn dispatch(cli: Cli) -> SetupResult<()> {
    let config = SetupConfig::load(cli.config.as_deref())?;
    let downloader = Downloader::new(build_http_client(&config)?);

    match cli.command {
        Command::Versions { stable } => list_versions(&config, &downloader, stable).await,
        Command::List { server } => {
            let catalog = load_catalog(&config, cli.mod_list.as_deref(), &downloader).await?;
            list_mods(&catalog, side_for(server));
            Ok(())
        }
        Command::Install(args) => {
            let catalog = load_catalog(&config, cli.mod_list.as_deref(), &downloader).await?;
            install(&config, downloader, &catalog, args).await
        }
    }
}

async fn load_catalog(
    config: &SetupConfig,
    mod_list: Option<&str>,
    downloader: &Downloader,
) -> SetupResult<Catalog> {
    let source = mod_list.unwrap_or(&config.mod_list_url);
    Catalog::load(source, downloader).await
}

fn side_for(server: bool) -> Side {
    if server {
        Side::Server
    } else {
        Side::Client
    }
}

// ── Listing ─────────────────────────────────────────────

async fn list_versions(
    config: &SetupConfig,
    downloader: &Downloader,
    stable_only: bool,
) -> SetupResult<()> {
    let versions = GameVersions::fetch(downloader, &config.fabric_meta).await?;
    for version in versions.all().iter().filter(|v| !stable_only || v.stable) {
        println!("{}", version.version);
    }
    Ok(())
}

fn list_mods(catalog: &Catalog, side: Side) {
    for entry in catalog.visible(side) {
        println!("{:<24} {:<28} {}", entry.id, entry.name, entry.resource.descriptor.label());
    }
    for rejected in catalog.rejected() {
        println!("{:<24} (invalid: {})", rejected.id, rejected.reason);
    }
}

// ── Install ─────────────────────────────────────────────

async fn install(
    config: &SetupConfig,
    downloader: Downloader,
    catalog: &Catalog,
    args: InstallArgs,
) -> SetupResult<()> {
    let side = side_for(args.server);

    let versions = GameVersions::fetch(&downloader, &config.fabric_meta).await?;
    let minecraft_version = versions.resolve_requested(&args.mc_version)?;

    let root = match args.dir {
        Some(dir) => dir,
        None if side == Side::Server => {
            return Err(SetupError::Other(
                "--dir is required when installing on a server".into(),
            ))
        }
        None => default_minecraft_dir().ok_or_else(|| {
            SetupError::Other("could not determine the default .minecraft directory".into())
        })?,
    };

    let visible: Vec<&CatalogEntry> = catalog.visible(side).collect();
    let selected = if args.mods.is_empty() {
        prompt_selection(visible).await?
    } else {
        select_mods(catalog, &visible, &args.mods)
    };

    let target = TargetDir::new(root);
    target.ensure().await?;
    if !args.keep_mods {
        let removed = target.clear_mods().await?;
        if removed > 0 {
            info!("Removed {} file(s) from {:?}", removed, target.mods_dir());
        }
    }

    let resolver = SourceResolver::new(config, downloader);
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current mod");
            watcher.cancel();
        }
    });

    let orchestrator = Orchestrator::new(catalog, &resolver).with_cancellation(cancel);
    let orchestrator = if args.yes {
        orchestrator.with_approver(AlwaysApprove)
    } else if args.no_alternatives {
        orchestrator.with_approver(NeverApprove)
    } else {
        orchestrator.with_approver(PromptApprover)
    };

    let request = InstallRequest {
        target,
        minecraft_version,
        selected,
    };
    let report = orchestrator.run(&request).await;

    print_report(&report);
    if let Some(path) = args.report {
        write_report(&report, &path).await?;
    }
    Ok(())
}

/// Resolve each `--mod` value to a catalog id. Unknown ids still go through
/// so the report shows them as invalid.
fn select_mods(
    catalog: &Catalog,
    visible: &[&CatalogEntry],
    requested: &[String],
) -> BTreeSet<String> {
    let mut selected = BTreeSet::new();
    for token in requested.iter().flat_map(|r| r.split(',')) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let id = match catalog.find_by_name(token) {
            Some(entry) if !catalog.contains(token) => entry.id.clone(),
            _ => token.to_string(),
        };
        if catalog.contains(&id) && !visible.iter().any(|e| e.id == id) {
            warn!("{} is not offered for this side, installing anyway", id);
        }
        selected.insert(id);
    }
    selected
}

/// Parse a prompt answer: 1-based numbers into `visible`, ids or names.
fn parse_selection(answer: &str, visible: &[&CatalogEntry]) -> SetupResult<BTreeSet<String>> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("all") {
        return Ok(visible.iter().map(|e| e.id.clone()).collect());
    }

    let mut selected = BTreeSet::new();
    for token in answer.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
        let entry = match token.parse::<usize>() {
            Ok(n) => n.checked_sub(1).and_then(|i| visible.get(i)).copied(),
            Err(_) => visible
                .iter()
                .find(|e| e.id == token || e.name.eq_ignore_ascii_case(token))
                .copied(),
        };
        match entry {
            Some(entry) => {
                selected.insert(entry.id.clone());
            }
            None => return Err(SetupError::Other(format!("unknown selection '{token}'"))),
        }
    }
    Ok(selected)
}

async fn prompt_selection(visible: Vec<&CatalogEntry>) -> SetupResult<BTreeSet<String>> {
    let mut menu = String::from("Which mods would you like to install?\n");
    for (i, entry) in visible.iter().enumerate() {
        menu.push_str(&format!("  {:>2}) {}\n", i + 1, entry.name));
    }
    menu.push_str("Numbers, ids or names separated by commas (or `all`): ");

    let answer = read_answer(menu).await?;
    parse_selection(&answer, &visible)
}

async fn read_answer(prompt: String) -> SetupResult<String> {
    tokio::task::spawn_blocking(move || {
        let mut stdout = std::io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok::<_, std::io::Error>(line)
    })
    .await
    .map_err(|e| SetupError::Other(format!("prompt task failed: {e}")))?
    .map_err(SetupError::from)
}

/// Asks on the terminal before falling back to an alternative.
struct PromptApprover;

#[async_trait]
impl AlternativeApprover for PromptApprover {
    async fn approve(
        &self,
        original: &CatalogEntry,
        alternative: &CatalogEntry,
        minecraft_version: &str,
    ) -> bool {
        let prompt = format!(
            "{} is not available for Minecraft {}. Install {} instead? [Y/n] ",
            original.name, minecraft_version, alternative.name
        );
        match read_answer(prompt).await {
            Ok(answer) => is_yes(&answer),
            Err(e) => {
                warn!("Could not read answer, declining alternative: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

// ── Reporting ───────────────────────────────────────────

fn print_report(report: &InstallReport) {
    for outcome in report.not_installed() {
        let label = match outcome.status {
            ModStatus::VersionUnavailable => "unavailable",
            ModStatus::Invalid => "invalid",
            ModStatus::Failed => "failed",
            _ => "skipped",
        };
        eprintln!("[{label}] {}: {}", outcome.requested_id, outcome.message);
    }
    for outcome in report.with_status(ModStatus::Installed) {
        if outcome.mod_id != outcome.requested_id {
            println!("{} installed in place of {}", outcome.mod_id, outcome.requested_id);
        }
        for warning in &outcome.warnings {
            eprintln!("[warning] {}: {}", outcome.mod_id, warning);
        }
    }

    println!(
        "Successfully installed {} mod(s) for Minecraft {}.",
        report.installed_count(),
        report.minecraft_version
    );
    if report.cancelled {
        println!("Installation was cancelled; remaining mods were not attempted.");
    }
    info!("{}", report.summary());
}

async fn write_report(report: &InstallReport, path: &Path) -> SetupResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| SetupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Wrote report to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::ResourceDescriptor;

    fn catalog() -> Catalog {
        Catalog::from_entries([
            CatalogEntry::new(
                "sodium",
                "Sodium",
                ResourceDescriptor::DirectUrl {
                    url: "https://example.invalid/sodium.jar".into(),
                },
            ),
            CatalogEntry::new(
                "lithium",
                "Lithium",
                ResourceDescriptor::DirectUrl {
                    url: "https://example.invalid/lithium.jar".into(),
                },
            ),
        ])
    }

    #[test]
    fn prompt_answer_accepts_numbers_ids_and_names() {
        let catalog = catalog();
        let visible: Vec<_> = catalog.visible(Side::Client).collect();

        let picked = parse_selection("1, lithium", &visible).unwrap();
        assert_eq!(picked.len(), 2);

        let picked = parse_selection("Lithium", &visible).unwrap();
        assert!(picked.contains("lithium"));

        assert!(parse_selection("3", &visible).is_err());
        assert!(parse_selection("0", &visible).is_err());
        assert!(parse_selection("", &visible).unwrap().is_empty());
        assert_eq!(parse_selection("all", &visible).unwrap().len(), 2);
    }

    #[test]
    fn mod_flags_keep_unknown_ids_for_the_report() {
        let catalog = catalog();
        let visible: Vec<_> = catalog.visible(Side::Client).collect();
        let picked = select_mods(
            &catalog,
            &visible,
            &["Sodium,ghost".to_string(), "lithium".to_string()],
        );
        let picked: Vec<_> = picked.into_iter().collect();
        assert_eq!(picked, vec!["ghost", "lithium", "sodium"]);
    }

    #[test]
    fn empty_answer_approves() {
        assert!(is_yes("\n"));
        assert!(is_yes("Yes"));
        assert!(!is_yes("n"));
    }
}
