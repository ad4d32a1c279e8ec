// ─── Fabric Quick Setup Core ───
// Mod resolution and installation engine.
//
// Architecture:
//   core/
//     catalog/    — Catalog model, mods.json parsing + validation
//     sources/    — Artifact lookup per source kind (URL, GitHub, Jenkins, mirror page)
//     deps        — Catalog-level dependency expansion
//     install/    — Batch orchestrator, alternative fallback, outcome report
//     version/    — Fabric Meta game versions + build label policy
//     downloader/ — HTTP helpers and streamed artifact writes
//     target      — Game directory / mods folder helpers
//     config      — Endpoints, timeout, credentials

pub mod catalog;
pub mod config;
pub mod deps;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod sources;
pub mod target;
#[cfg(test)]
pub(crate) mod test_support;
pub mod version;
