pub mod artifact;
pub mod direct;
pub mod github;
pub mod jenkins;
pub mod mirror;
pub mod resolver;

pub use artifact::ResolvedArtifact;
pub use resolver::{ModSource, SourceResolver};
