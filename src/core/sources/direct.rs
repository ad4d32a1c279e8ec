use tracing::debug;

use super::artifact::ResolvedArtifact;
use crate::core::error::SetupResult;

/// Fixed URL downloads. Version-agnostic: nothing to look up.
pub struct DirectSource;

impl DirectSource {
    pub fn locate(&self, url: &str) -> SetupResult<ResolvedArtifact> {
        let artifact = ResolvedArtifact::from_url(url)?;
        debug!("Direct download {} as {}", artifact.url, artifact.file_name);
        Ok(artifact)
    }
}
