use reqwest::Url;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::artifact::ResolvedArtifact;
use crate::core::downloader::{is_not_found, Downloader};
use crate::core::error::{SetupError, SetupResult};
use crate::core::version::{release_label, GameVersions, VersionMappingPolicy};

#[derive(Debug, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub artifacts: Vec<BuildArtifact>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildArtifact {
    pub file_name: String,
    pub relative_path: String,
}

/// Picks the artifact of the last successful build of a Jenkins job.
pub struct JenkinsBuilds {
    downloader: Downloader,
    default_server: String,
    fabric_meta: String,
    /// Fetched at most once per run, and only when a snapshot needs mapping.
    game_versions: OnceCell<GameVersions>,
}

impl JenkinsBuilds {
    pub fn new(downloader: Downloader, default_server: &str, fabric_meta: &str) -> Self {
        Self {
            downloader,
            default_server: default_server.to_string(),
            fabric_meta: fabric_meta.to_string(),
            game_versions: OnceCell::new(),
        }
    }

    pub async fn locate(
        &self,
        server: Option<&str>,
        project_path: &str,
        policy: VersionMappingPolicy,
        minecraft_version: &str,
    ) -> SetupResult<ResolvedArtifact> {
        let label = self.label_for(minecraft_version, policy).await?;
        let job = format!("{project_path} {label}");
        let server = server.unwrap_or(&self.default_server);
        let build_url = last_successful_build_url(server, &job)?;

        let api_url = append_segments(build_url.clone(), ["api", "json"]).to_string();
        let build: Build = match self
            .downloader
            .json(self.downloader.get(&api_url), &api_url)
            .await
        {
            Ok(build) => build,
            Err(e) if is_not_found(&e) => {
                debug!("No job or successful build at {}", api_url);
                return Err(SetupError::version_unavailable(job, minecraft_version));
            }
            Err(e) => return Err(e),
        };

        let artifact = select_build_artifact(build.artifacts)
            .ok_or_else(|| SetupError::version_unavailable(job.clone(), minecraft_version))?;

        let mut artifact_url = append_segments(build_url, ["artifact"]);
        artifact_url = append_segments(artifact_url, artifact.relative_path.split('/'));

        info!(
            "Selected {} from {} build #{}",
            artifact.file_name,
            job,
            build.number.unwrap_or_default()
        );
        ResolvedArtifact::new(artifact_url.to_string(), &artifact.file_name)
    }

    async fn label_for(
        &self,
        minecraft_version: &str,
        policy: VersionMappingPolicy,
    ) -> SetupResult<String> {
        // Stable versions and exact mapping need no version list.
        if let Some(label) = release_label(minecraft_version, [], policy) {
            return Ok(label);
        }

        let versions = self
            .game_versions
            .get_or_try_init(|| GameVersions::fetch(&self.downloader, &self.fabric_meta))
            .await?;

        let label = release_label(minecraft_version, versions.ids(), policy)
            .ok_or_else(|| SetupError::version_unavailable("Release label", minecraft_version))?;
        debug!("Mapped {} to release label {}", minecraft_version, label);
        Ok(label)
    }
}

/// `<server>/job/<seg>/job/<seg>/lastSuccessfulBuild/`, one `job` per path segment.
pub fn last_successful_build_url(server: &str, job_path: &str) -> SetupResult<Url> {
    let mut url = Url::parse(server)
        .map_err(|e| SetupError::Structure(format!("bad Jenkins URL '{server}': {e}")))?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| SetupError::Structure(format!("Jenkins URL '{server}' cannot be a base")))?;
        segments.pop_if_empty();
        for part in job_path.split('/') {
            segments.push("job").push(part);
        }
        segments.push("lastSuccessfulBuild");
    }

    Ok(url)
}

fn append_segments<'a>(mut url: Url, parts: impl IntoIterator<Item = &'a str>) -> Url {
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(parts);
    }
    url
}

/// The lexicographically last artifact by file name.
pub fn select_build_artifact(artifacts: Vec<BuildArtifact>) -> Option<BuildArtifact> {
    artifacts
        .into_iter()
        .max_by(|a, b| a.file_name.cmp(&b.file_name))
}
