use serde::Serialize;

use crate::core::version::VersionMappingPolicy;

/// Where and how a mod artifact is obtained. Exactly one source kind per descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDescriptor {
    /// A fixed download URL, valid for every game version.
    DirectUrl { url: String },
    /// Assets attached to the releases of a GitHub repository (`owner/name`).
    TaggedRelease {
        repository: String,
        /// Pins a single release. `None` searches every release, newest last.
        release_tag: Option<String>,
        version_agnostic: bool,
    },
    /// Newest successful build of a Jenkins job whose name is derived from the game version.
    ContinuousBuild {
        /// Jenkins root; falls back to the configured default when absent.
        server: Option<String>,
        /// Job path prefix, e.g. `Fabric/API`. The release label is appended.
        project_path: String,
        policy: VersionMappingPolicy,
    },
    /// A download discovered by scraping an HTML listing page.
    ScrapedMirror {
        /// Listing page; falls back to the configured OptiFine downloads page.
        catalog_page_url: Option<String>,
    },
}

impl ResourceDescriptor {
    /// Short human label for logs, e.g. `github:CaffeineMC/sodium-fabric`.
    pub fn label(&self) -> String {
        match self {
            ResourceDescriptor::DirectUrl { url } => format!("url:{url}"),
            ResourceDescriptor::TaggedRelease {
                repository,
                release_tag,
                ..
            } => match release_tag {
                Some(tag) => format!("github:{repository}@{tag}"),
                None => format!("github:{repository}"),
            },
            ResourceDescriptor::ContinuousBuild { project_path, .. } => {
                format!("jenkins:{project_path}")
            }
            ResourceDescriptor::ScrapedMirror { catalog_page_url } => format!(
                "mirror:{}",
                catalog_page_url.as_deref().unwrap_or("optifine")
            ),
        }
    }

    /// Resolution of this descriptor never depends on the target version.
    pub fn is_version_agnostic(&self) -> bool {
        match self {
            ResourceDescriptor::DirectUrl { .. } => true,
            ResourceDescriptor::TaggedRelease {
                version_agnostic, ..
            } => *version_agnostic,
            _ => false,
        }
    }
}

/// A descriptor plus the inline dependencies that must be installed before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModResource {
    pub descriptor: ResourceDescriptor,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<InlineDependency>,
}

impl ModResource {
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, name: impl Into<String>, resource: ModResource) -> Self {
        self.dependencies.push(InlineDependency {
            name: name.into(),
            resource,
        });
        self
    }
}

/// A dependency declared on the resource itself rather than by catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineDependency {
    pub name: String,
    pub resource: ModResource,
}

/// Install sides a mod is offered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub client: bool,
    pub server: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            client: true,
            server: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Server => write!(f, "server"),
        }
    }
}

impl Visibility {
    pub fn allows(&self, side: Side) -> bool {
        match side {
            Side::Client => self.client,
            Side::Server => self.server,
        }
    }
}

/// One mod definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub resource: ModResource,
    /// Catalog ids installed alongside this mod.
    pub dependencies: Vec<String>,
    /// Substitute offered when `resource` has nothing for the target version.
    pub alternative: Option<Box<CatalogEntry>>,
    pub visibility: Visibility,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, descriptor: ResourceDescriptor) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource: ModResource::new(descriptor),
            dependencies: Vec::new(),
            alternative: None,
            visibility: Visibility::default(),
        }
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn or_else(mut self, alternative: CatalogEntry) -> Self {
        self.alternative = Some(Box::new(alternative));
        self
    }

    pub fn with_resource(mut self, resource: ModResource) -> Self {
        self.resource = resource;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_and_agnostic_releases_ignore_version() {
        let direct = ResourceDescriptor::DirectUrl {
            url: "https://x/y.jar".into(),
        };
        let agnostic = ResourceDescriptor::TaggedRelease {
            repository: "o/r".into(),
            release_tag: None,
            version_agnostic: true,
        };
        let scraped = ResourceDescriptor::ScrapedMirror {
            catalog_page_url: None,
        };
        assert!(direct.is_version_agnostic());
        assert!(agnostic.is_version_agnostic());
        assert!(!scraped.is_version_agnostic());
    }

    #[test]
    fn label_includes_pinned_tag() {
        let pinned = ResourceDescriptor::TaggedRelease {
            repository: "o/r".into(),
            release_tag: Some("v1".into()),
            version_agnostic: false,
        };
        assert_eq!(pinned.label(), "github:o/r@v1");
    }

    #[test]
    fn server_only_mod_is_hidden_on_client() {
        let vis = Visibility {
            client: false,
            server: true,
        };
        assert!(!vis.allows(Side::Client));
        assert!(vis.allows(Side::Server));
    }
}
