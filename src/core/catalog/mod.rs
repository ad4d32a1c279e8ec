mod index;
mod model;
mod raw;

pub use index::{Catalog, RejectedEntry};
pub use model::{
    CatalogEntry, InlineDependency, ModResource, ResourceDescriptor, Side, Visibility,
};
pub use raw::FABRIC_API_JOB;

use crate::core::error::{SetupError, SetupResult};

/// Check that an entry is usable: every descriptor in it (own resource,
/// inline dependencies, alternative chain) has its required fields.
pub fn validate(entry: &CatalogEntry) -> SetupResult<()> {
    if entry.id.trim().is_empty() {
        return Err(SetupError::invalid_entry("<unnamed>", "missing mod id"));
    }
    if entry.dependencies.iter().any(|dep| dep.trim().is_empty()) {
        return Err(SetupError::invalid_entry(&entry.id, "empty dependency id"));
    }

    validate_resource(&entry.id, &entry.resource)?;

    if let Some(alt) = &entry.alternative {
        validate(alt).map_err(|e| {
            SetupError::invalid_entry(&entry.id, format!("alternative rejected: {e}"))
        })?;
    }

    Ok(())
}

fn validate_resource(id: &str, resource: &ModResource) -> SetupResult<()> {
    validate_descriptor(id, &resource.descriptor)?;
    for dep in &resource.dependencies {
        validate_resource(id, &dep.resource)?;
    }
    Ok(())
}

fn validate_descriptor(id: &str, descriptor: &ResourceDescriptor) -> SetupResult<()> {
    match descriptor {
        ResourceDescriptor::DirectUrl { url } => check_url(id, url),
        ResourceDescriptor::TaggedRelease { repository, .. } => {
            let mut parts = repository.split('/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(()),
                _ => Err(SetupError::invalid_entry(
                    id,
                    format!("repository '{repository}' is not of the form owner/name"),
                )),
            }
        }
        ResourceDescriptor::ContinuousBuild {
            server,
            project_path,
            ..
        } => {
            if project_path.split('/').any(|seg| seg.trim().is_empty()) {
                return Err(SetupError::invalid_entry(
                    id,
                    format!("job path '{project_path}' has an empty segment"),
                ));
            }
            match server {
                Some(server) => check_url(id, server),
                None => Ok(()),
            }
        }
        ResourceDescriptor::ScrapedMirror { catalog_page_url } => match catalog_page_url {
            Some(page) => check_url(id, page),
            None => Ok(()),
        },
    }
}

fn check_url(id: &str, raw: &str) -> SetupResult<()> {
    match reqwest::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(SetupError::invalid_entry(
            id,
            format!("unsupported URL scheme '{}' in {raw}", url.scheme()),
        )),
        Err(e) => Err(SetupError::invalid_entry(id, format!("bad URL '{raw}': {e}"))),
    }
}
