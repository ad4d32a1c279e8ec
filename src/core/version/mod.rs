pub mod manifest;
pub mod policy;

pub use manifest::{GameVersion, GameVersions};
pub use policy::{is_stable, release_label, VersionMappingPolicy};
