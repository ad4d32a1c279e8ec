use serde::Serialize;

use crate::core::error::{SetupError, SetupResult};

/// A located artifact: where to download it from and what to call it on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifact {
    pub url: String,
    pub file_name: String,
}

impl ResolvedArtifact {
    /// Build an artifact, checking that `file_name` is a bare file name.
    pub fn new(url: impl Into<String>, file_name: &str) -> SetupResult<Self> {
        Ok(Self {
            url: url.into(),
            file_name: sanitize_file_name(file_name)?,
        })
    }

    /// Name the artifact after the last path segment of its URL.
    pub fn from_url(url: &str) -> SetupResult<Self> {
        let name = file_name_from_url(url)?;
        Self::new(url, &name)
    }
}

/// Reject names that would escape the mods directory.
pub fn sanitize_file_name(raw: &str) -> SetupResult<String> {
    let name = raw.trim();
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(SetupError::Structure(format!(
            "unusable artifact file name '{raw}'"
        )));
    }
    Ok(name.to_string())
}

/// Last non-empty path segment of `url`, query string excluded.
pub fn file_name_from_url(url: &str) -> SetupResult<String> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| SetupError::Structure(format!("bad artifact URL '{url}': {e}")))?;

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| SetupError::Structure(format!("artifact URL '{url}' has no file name")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_comes_from_last_segment() {
        let artifact = ResolvedArtifact::from_url("http://x/y.jar").unwrap();
        assert_eq!(artifact.file_name, "y.jar");

        let with_query = ResolvedArtifact::from_url("https://cdn.example/mods/a.jar?dl=1").unwrap();
        assert_eq!(with_query.file_name, "a.jar");
    }

    #[test]
    fn url_without_path_has_no_name() {
        assert!(matches!(
            ResolvedArtifact::from_url("https://example.com/"),
            Err(SetupError::Structure(_))
        ));
    }

    #[test]
    fn traversal_names_are_rejected() {
        for bad in ["", "  ", "../evil.jar", "a/b.jar", "a\\b.jar", ".", ".."] {
            assert!(sanitize_file_name(bad).is_err(), "{bad:?} accepted");
        }
        assert_eq!(sanitize_file_name("mod..jar").unwrap(), "mod..jar");
        assert_eq!(sanitize_file_name(" OptiFine_1.20.1_HD_U_I6.jar ").unwrap(), "OptiFine_1.20.1_HD_U_I6.jar");
    }
}
