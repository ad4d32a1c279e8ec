// ─── Catalog JSON ───
// Loose serde shapes for `mods.json` and their conversion into the typed model.
// Every field is optional here so that a malformed entry turns into an
// `InvalidEntry` with a reason instead of failing the whole document.

use serde::Deserialize;
use serde_json::Value;

use super::model::{CatalogEntry, InlineDependency, ModResource, ResourceDescriptor, Visibility};
use crate::core::error::{SetupError, SetupResult};
use crate::core::version::VersionMappingPolicy;

pub const FABRIC_API_JOB: &str = "Fabric/API";

#[derive(Debug, Deserialize)]
pub struct RawEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub resource: Option<RawResource>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub alternative: Option<Box<RawEntry>>,
    pub visible: Option<RawVisibility>,
}

#[derive(Debug, Deserialize)]
pub struct RawResource {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub repo: Option<String>,
    /// Release id or tag; the upstream catalog uses both numbers and strings.
    pub release: Option<Value>,
    #[serde(rename = "version-agnostic", alias = "version_agnostic", default)]
    pub version_agnostic: bool,
    pub job: Option<String>,
    pub server: Option<String>,
    pub policy: Option<String>,
    pub page: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
}

#[derive(Debug, Deserialize)]
pub struct RawDependency {
    pub name: Option<String>,
    pub resource: Option<RawResource>,
}

#[derive(Debug, Deserialize)]
pub struct RawVisibility {
    #[serde(default = "yes")]
    pub client: bool,
    #[serde(default = "yes")]
    pub server: bool,
}

fn yes() -> bool {
    true
}

/// Parse one element of the catalog array. `position` names entries without an id.
pub fn parse_entry(value: Value, position: usize) -> Result<CatalogEntry, (String, SetupError)> {
    let fallback_id = value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("<entry #{position}>"));

    let raw: RawEntry = serde_json::from_value(value)
        .map_err(|e| (fallback_id.clone(), SetupError::invalid_entry(&fallback_id, e.to_string())))?;

    raw.into_entry()
        .map_err(|e| (fallback_id, e))
}

impl RawEntry {
    pub fn into_entry(self) -> SetupResult<CatalogEntry> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(SetupError::invalid_entry("<unnamed>", "missing mod id")),
        };

        let resource = match self.resource {
            Some(resource) => resource.into_resource(&id)?,
            None => {
                return Err(SetupError::invalid_entry(
                    &id,
                    "No valid mod resource data was found",
                ))
            }
        };

        let alternative = match self.alternative {
            Some(alt) => {
                let alt = (*alt).into_entry().map_err(|e| {
                    SetupError::invalid_entry(&id, format!("alternative rejected: {e}"))
                })?;
                Some(Box::new(alt))
            }
            None => None,
        };

        let visibility = self
            .visible
            .map(|v| Visibility {
                client: v.client,
                server: v.server,
            })
            .unwrap_or_default();

        let entry = CatalogEntry {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            resource,
            dependencies: self.dependencies,
            alternative,
            visibility,
        };

        super::validate(&entry)?;
        Ok(entry)
    }
}

impl RawResource {
    fn into_resource(self, id: &str) -> SetupResult<ModResource> {
        let descriptor = self.descriptor(id)?;

        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for (index, dep) in self.dependencies.into_iter().enumerate() {
            let name = dep
                .name
                .unwrap_or_else(|| format!("{id} dependency #{}", index + 1));
            let resource = dep.resource.ok_or_else(|| {
                SetupError::invalid_entry(id, format!("inline dependency '{name}' has no resource"))
            })?;
            dependencies.push(InlineDependency {
                resource: resource.into_resource(id)?,
                name,
            });
        }

        Ok(ModResource {
            descriptor,
            dependencies,
        })
    }

    fn descriptor(&self, id: &str) -> SetupResult<ResourceDescriptor> {
        let require = |field: &Option<String>, what: &str| -> SetupResult<String> {
            field
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| SetupError::invalid_entry(id, format!("missing '{what}'")))
        };

        match self.kind.as_deref() {
            Some("github") => Ok(ResourceDescriptor::TaggedRelease {
                repository: require(&self.repo, "repo")?,
                release_tag: release_tag(self.release.as_ref(), id)?,
                version_agnostic: self.version_agnostic,
            }),
            Some("fabric") => Ok(ResourceDescriptor::ContinuousBuild {
                server: None,
                project_path: self
                    .job
                    .clone()
                    .unwrap_or_else(|| FABRIC_API_JOB.to_string()),
                policy: VersionMappingPolicy::NextRelease,
            }),
            Some("jenkins") => Ok(ResourceDescriptor::ContinuousBuild {
                server: self.server.clone(),
                project_path: require(&self.job, "job")?,
                policy: match self.policy.as_deref() {
                    None => VersionMappingPolicy::NextRelease,
                    Some(raw) => raw.parse().map_err(|e| SetupError::invalid_entry(id, e))?,
                },
            }),
            Some("optifine") => Ok(ResourceDescriptor::ScrapedMirror {
                catalog_page_url: None,
            }),
            Some("mirror") => Ok(ResourceDescriptor::ScrapedMirror {
                catalog_page_url: Some(require(&self.page, "page")?),
            }),
            Some("url") => Ok(ResourceDescriptor::DirectUrl {
                url: require(&self.url, "url")?,
            }),
            Some(other) => Err(SetupError::invalid_entry(
                id,
                format!("unknown resource type '{other}'"),
            )),
            None => match self.url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => Ok(ResourceDescriptor::DirectUrl {
                    url: url.to_string(),
                }),
                _ => Err(SetupError::invalid_entry(
                    id,
                    "No valid mod resource data was found",
                )),
            },
        }
    }
}

fn release_tag(value: Option<&Value>, id: &str) -> SetupResult<Option<String>> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(SetupError::invalid_entry(
            id,
            format!("'release' must be a tag or id, got {other}"),
        )),
    }
}
