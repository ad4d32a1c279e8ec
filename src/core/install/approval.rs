use async_trait::async_trait;

use crate::core::catalog::CatalogEntry;

/// Decides whether an alternative may replace a mod that has no artifact
/// for the target version. Interactive front ends prompt here.
#[async_trait]
pub trait AlternativeApprover: Send + Sync {
    async fn approve(
        &self,
        original: &CatalogEntry,
        alternative: &CatalogEntry,
        minecraft_version: &str,
    ) -> bool;
}

/// Accept every alternative.
pub struct AlwaysApprove;

/// Decline every alternative.
pub struct NeverApprove;

#[async_trait]
impl AlternativeApprover for AlwaysApprove {
    async fn approve(&self, _: &CatalogEntry, _: &CatalogEntry, _: &str) -> bool {
        true
    }
}

#[async_trait]
impl AlternativeApprover for NeverApprove {
    async fn approve(&self, _: &CatalogEntry, _: &CatalogEntry, _: &str) -> bool {
        false
    }
}

#[async_trait]
impl<A: AlternativeApprover + ?Sized> AlternativeApprover for &A {
    async fn approve(
        &self,
        original: &CatalogEntry,
        alternative: &CatalogEntry,
        minecraft_version: &str,
    ) -> bool {
        (**self)
            .approve(original, alternative, minecraft_version)
            .await
    }
}
