use std::path::Path;

use async_trait::async_trait;

use super::artifact::ResolvedArtifact;
use super::{
    direct::DirectSource, github::GithubReleases, jenkins::JenkinsBuilds, mirror::MirrorScraper,
};
use crate::core::catalog::ResourceDescriptor;
use crate::core::config::SetupConfig;
use crate::core::downloader::Downloader;
use crate::core::error::SetupResult;

/// Everything the orchestrator needs from the outside world to install one mod.
#[async_trait]
pub trait ModSource: Send + Sync {
    /// Find the artifact for `descriptor` that matches `minecraft_version`.
    async fn locate(
        &self,
        descriptor: &ResourceDescriptor,
        minecraft_version: &str,
    ) -> SetupResult<ResolvedArtifact>;

    /// Write the artifact to `dest`, replacing any existing file. Returns bytes written.
    async fn fetch(&self, artifact: &ResolvedArtifact, dest: &Path) -> SetupResult<u64>;
}

/// Dispatches each descriptor kind to its source strategy over HTTP.
pub struct SourceResolver {
    downloader: Downloader,
    direct: DirectSource,
    github: GithubReleases,
    jenkins: JenkinsBuilds,
    mirror: MirrorScraper,
}

impl SourceResolver {
    pub fn new(config: &SetupConfig, downloader: Downloader) -> Self {
        Self {
            direct: DirectSource,
            github: GithubReleases::new(
                downloader.clone(),
                &config.github_api,
                config.github_token.clone(),
            ),
            jenkins: JenkinsBuilds::new(downloader.clone(), &config.jenkins_url, &config.fabric_meta),
            mirror: MirrorScraper::new(downloader.clone(), &config.optifine_downloads),
            downloader,
        }
    }
}

#[async_trait]
impl ModSource for SourceResolver {
    async fn locate(
        &self,
        descriptor: &ResourceDescriptor,
        minecraft_version: &str,
    ) -> SetupResult<ResolvedArtifact> {
        match descriptor {
            ResourceDescriptor::DirectUrl { url } => self.direct.locate(url),
            ResourceDescriptor::TaggedRelease {
                repository,
                release_tag,
                version_agnostic,
            } => {
                self.github
                    .locate(
                        repository,
                        release_tag.as_deref(),
                        *version_agnostic,
                        minecraft_version,
                    )
                    .await
            }
            ResourceDescriptor::ContinuousBuild {
                server,
                project_path,
                policy,
            } => {
                self.jenkins
                    .locate(server.as_deref(), project_path, *policy, minecraft_version)
                    .await
            }
            ResourceDescriptor::ScrapedMirror { catalog_page_url } => {
                self.mirror
                    .locate(catalog_page_url.as_deref(), minecraft_version)
                    .await
            }
        }
    }

    async fn fetch(&self, artifact: &ResolvedArtifact, dest: &Path) -> SetupResult<u64> {
        self.downloader.download_file(&artifact.url, dest).await
    }
}
