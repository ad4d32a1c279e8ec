use std::collections::BTreeSet;

use tracing::debug;

use crate::core::catalog::Catalog;

/// Add the catalog-level dependencies of every selected mod to the selection.
///
/// Single pass: dependencies of dependencies are not followed. Ids with no
/// catalog entry are kept as-is and reported later by the orchestrator.
pub fn expand(selected: &BTreeSet<String>, catalog: &Catalog) -> BTreeSet<String> {
    let mut working_set = selected.clone();

    for entry in catalog
        .entries()
        .iter()
        .filter(|entry| selected.contains(&entry.id))
    {
        for dep in &entry.dependencies {
            if working_set.insert(dep.clone()) {
                debug!("{} pulls in dependency {}", entry.id, dep);
            }
        }
    }

    working_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{CatalogEntry, ResourceDescriptor};
    use pretty_assertions::assert_eq;

    fn entry(id: &str, deps: &[&str]) -> CatalogEntry {
        deps.iter().fold(
            CatalogEntry::new(
                id,
                id,
                ResourceDescriptor::DirectUrl {
                    url: format!("http://x/{id}.jar"),
                },
            ),
            |e, d| e.depends_on(*d),
        )
    }

    fn ids(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn adds_direct_dependencies() {
        let catalog = Catalog::from_entries([entry("a", &["b"]), entry("b", &[])]);
        assert_eq!(expand(&ids(&["a"]), &catalog), ids(&["a", "b"]));
    }

    #[test]
    fn does_not_follow_dependencies_of_dependencies() {
        let catalog = Catalog::from_entries([entry("a", &["b"]), entry("b", &["c"]), entry("c", &[])]);
        assert_eq!(expand(&ids(&["a"]), &catalog), ids(&["a", "b"]));
    }

    #[test]
    fn never_removes_selected_ids() {
        let catalog = Catalog::from_entries([entry("a", &[])]);
        let selected = ids(&["a", "ghost", "other"]);
        let expanded = expand(&selected, &catalog);
        assert!(expanded.is_superset(&selected));
        assert_eq!(expanded, selected);
    }

    #[test]
    fn dangling_dependency_is_passed_through() {
        let catalog = Catalog::from_entries([entry("a", &["missing"])]);
        assert_eq!(expand(&ids(&["a"]), &catalog), ids(&["a", "missing"]));
    }

    #[test]
    fn empty_selection_stays_empty() {
        let catalog = Catalog::from_entries([entry("a", &["b"])]);
        assert!(expand(&BTreeSet::new(), &catalog).is_empty());
    }
}
