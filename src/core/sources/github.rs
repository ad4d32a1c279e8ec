use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, info};

use super::artifact::ResolvedArtifact;
use crate::core::downloader::Downloader;
use crate::core::error::{SetupError, SetupResult};

const PER_PAGE: usize = 100;
/// Upper bound on release pages fetched for one repository.
const MAX_PAGES: usize = 10;

#[derive(Debug, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Picks artifacts from the releases of a GitHub repository.
pub struct GithubReleases {
    downloader: Downloader,
    api_base: String,
    token: Option<String>,
}

impl GithubReleases {
    pub fn new(downloader: Downloader, api_base: &str, token: Option<String>) -> Self {
        Self {
            downloader,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub async fn locate(
        &self,
        repository: &str,
        release_tag: Option<&str>,
        version_agnostic: bool,
        minecraft_version: &str,
    ) -> SetupResult<ResolvedArtifact> {
        let assets = match release_tag {
            Some(tag) => self.fetch_release(repository, tag).await?.assets,
            None => self.fetch_all_assets(repository).await?,
        };
        debug!("{}: {} candidate assets", repository, assets.len());

        let asset = select_release_asset(assets, minecraft_version, version_agnostic)
            .ok_or_else(|| SetupError::version_unavailable(repository, minecraft_version))?;

        info!("Selected {} from {}", asset.name, repository);
        ResolvedArtifact::new(asset.browser_download_url, &asset.name)
    }

    /// One pinned release. Numeric pins are release ids, anything else a tag.
    async fn fetch_release(&self, repository: &str, tag: &str) -> SetupResult<Release> {
        let url = if tag.chars().all(|c| c.is_ascii_digit()) {
            format!("{}/repos/{}/releases/{}", self.api_base, repository, tag)
        } else {
            format!("{}/repos/{}/releases/tags/{}", self.api_base, repository, tag)
        };
        self.get_json(&url).await
    }

    /// Assets of every release, oldest release first.
    async fn fetch_all_assets(&self, repository: &str) -> SetupResult<Vec<ReleaseAsset>> {
        let mut releases: Vec<Release> = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!(
                "{}/repos/{}/releases?per_page={}&page={}",
                self.api_base, repository, PER_PAGE, page
            );
            let batch: Vec<Release> = self.get_json(&url).await?;
            let last_page = batch.len() < PER_PAGE;
            releases.extend(batch);
            if last_page {
                break;
            }
        }

        Ok(assets_oldest_first(releases))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> SetupResult<T> {
        let mut request = self
            .downloader
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.downloader.json(request, url).await
    }
}

/// GitHub lists releases newest first; flatten them oldest first so that the
/// most recently published matching asset ends up last.
pub fn assets_oldest_first(releases_newest_first: Vec<Release>) -> Vec<ReleaseAsset> {
    releases_newest_first
        .into_iter()
        .rev()
        .flat_map(|release| release.assets)
        .collect()
}

/// Keep assets whose name mentions `minecraft_version` (unless agnostic) and
/// take the last one.
pub fn select_release_asset(
    assets: Vec<ReleaseAsset>,
    minecraft_version: &str,
    version_agnostic: bool,
) -> Option<ReleaseAsset> {
    assets
        .into_iter()
        .filter(|asset| version_agnostic || asset.name.contains(minecraft_version))
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::test_support::{downloader, TestHttpServer};
    use axum::{routing::get, Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.into(),
            browser_download_url: format!("https://github.com/o/r/releases/download/v/{name}"),
        }
    }

    fn release(tag: &str, names: &[&str]) -> Release {
        Release {
            tag_name: tag.into(),
            assets: names.iter().map(|n| asset(n)).collect(),
        }
    }

    #[test]
    fn last_matching_asset_wins() {
        let assets = vec![
            asset("mod-1.19.jar"),
            asset("mod-1.20.jar"),
            asset("mod-1.20-beta.jar"),
        ];
        let chosen = select_release_asset(assets, "1.20", false).unwrap();
        assert_eq!(chosen.name, "mod-1.20-beta.jar");
    }

    #[test]
    fn no_match_is_none() {
        let assets = vec![asset("mod-1.19.jar")];
        assert_eq!(select_release_asset(assets, "1.20", false), None);
    }

    #[test]
    fn agnostic_ignores_version_filter() {
        let assets = vec![asset("mod-1.19.jar"), asset("mod-universal.jar")];
        let chosen = select_release_asset(assets, "1.20", true).unwrap();
        assert_eq!(chosen.name, "mod-universal.jar");
    }

    #[test]
    fn releases_are_flattened_oldest_first() {
        let newest_first = vec![
            release("v3", &["mod-1.20-v3.jar"]),
            release("v2", &["mod-1.20-v2.jar", "mod-1.19-v2.jar"]),
            release("v1", &["mod-1.20-v1.jar"]),
        ];
        let flat: Vec<_> = assets_oldest_first(newest_first)
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(
            flat,
            vec!["mod-1.20-v1.jar", "mod-1.20-v2.jar", "mod-1.19-v2.jar", "mod-1.20-v3.jar"]
        );
    }

    #[test]
    fn newest_release_match_is_selected_across_releases() {
        let newest_first = vec![
            release("v3", &["mod-1.21-v3.jar"]),
            release("v2", &["mod-1.20-v2.jar"]),
            release("v1", &["mod-1.20-v1.jar"]),
        ];
        let chosen =
            select_release_asset(assets_oldest_first(newest_first), "1.20", false).unwrap();
        assert_eq!(chosen.name, "mod-1.20-v2.jar");
    }

    #[test]
    fn release_json_without_assets_deserializes() {
        let release: Release = serde_json::from_str(r#"{ "tag_name": "v1" }"#).unwrap();
        assert_eq!(release.tag_name, "v1");
        assert!(release.assets.is_empty());
    }

    fn release_json(tag: &str, asset_name: &str) -> Value {
        json!({
            "tag_name": tag,
            "assets": [{
                "name": asset_name,
                "browser_download_url": format!("https://dl.example/{tag}/{asset_name}"),
            }]
        })
    }

    async fn releases_server() -> TestHttpServer {
        let router = Router::new()
            .route(
                "/repos/o/r/releases",
                get(|| async {
                    Json(json!([
                        release_json("v3", "mod-1.20-v3.jar"),
                        release_json("v2", "mod-1.20-v2.jar"),
                    ]))
                }),
            )
            .route(
                "/repos/o/r/releases/42",
                get(|| async { Json(release_json("v42", "mod-1.20-v42.jar")) }),
            )
            .route(
                "/repos/o/r/releases/tags/v1.0",
                get(|| async { Json(release_json("v1.0", "mod-1.20-v1.0.jar")) }),
            );
        TestHttpServer::new(router).await
    }

    #[tokio::test]
    async fn pinned_release_is_the_only_one_inspected() {
        let server = releases_server().await;
        let github = GithubReleases::new(downloader(), server.base_url(), None);

        let by_id = github.locate("o/r", Some("42"), false, "1.20").await.unwrap();
        assert_eq!(by_id.file_name, "mod-1.20-v42.jar");
        assert_eq!(by_id.url, "https://dl.example/v42/mod-1.20-v42.jar");

        let by_tag = github.locate("o/r", Some("v1.0"), false, "1.20").await.unwrap();
        assert_eq!(by_tag.file_name, "mod-1.20-v1.0.jar");
    }

    #[tokio::test]
    async fn unpinned_lookup_prefers_newest_release() {
        let server = releases_server().await;
        let github = GithubReleases::new(downloader(), server.base_url(), None);

        let artifact = github.locate("o/r", None, false, "1.20").await.unwrap();
        assert_eq!(artifact.file_name, "mod-1.20-v3.jar");
    }

    #[tokio::test]
    async fn pinned_release_without_matching_asset_is_unavailable() {
        let server = releases_server().await;
        let github = GithubReleases::new(downloader(), server.base_url(), None);

        let err = github.locate("o/r", Some("42"), false, "1.19").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionUnavailable);

        let agnostic = github.locate("o/r", Some("42"), true, "1.19").await.unwrap();
        assert_eq!(agnostic.file_name, "mod-1.20-v42.jar");
    }
}
