use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// How a continuous-build job label is derived from the target game version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionMappingPolicy {
    /// Stable versions map to themselves. Snapshots map to the release they
    /// lead up to: the nearest older stable version with its last component
    /// bumped by one (`21w05a` after `1.16` → `1.17`).
    NextRelease,
    /// The job is named after the target version verbatim.
    Exact,
}

impl FromStr for VersionMappingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "next-release" => Ok(Self::NextRelease),
            "exact" => Ok(Self::Exact),
            other => Err(format!(
                "unknown version policy '{other}' (expected next-release or exact)"
            )),
        }
    }
}

fn stable_shape() -> &'static Regex {
    static STABLE: OnceLock<Regex> = OnceLock::new();
    STABLE.get_or_init(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").expect("static regex"))
}

/// `true` for release-shaped versions such as `1.16` or `1.20.1`.
pub fn is_stable(version: &str) -> bool {
    stable_shape().is_match(version)
}

/// Increment the last numeric component: `1.16` → `1.17`, `1.20.1` → `1.20.2`.
pub fn bump_last_component(version: &str) -> Option<String> {
    let (head, last) = match version.rsplit_once('.') {
        Some(split) => split,
        None => return None,
    };
    let next = last.parse::<u32>().ok()?.checked_add(1)?;
    Some(format!("{head}.{next}"))
}

/// Map `version` to the label of the build job tracking it.
///
/// `known_versions` must be in Fabric Meta order (newest first); the scan
/// starts at the entry right after `version`. Returns `None` when `version`
/// is not stable and either is unknown or has no stable version after it.
pub fn release_label<'a, I>(
    version: &str,
    known_versions: I,
    policy: VersionMappingPolicy,
) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    if policy == VersionMappingPolicy::Exact || is_stable(version) {
        return Some(version.to_string());
    }

    known_versions
        .into_iter()
        .skip_while(|candidate| *candidate != version)
        .skip(1)
        .find(|candidate| is_stable(candidate))
        .and_then(bump_last_component)
}
