//! Dependency resolution.
//!
//! Builds the tag-name map used to recognize nested custom elements while
//! expanding a component. Dependency graphs may contain cycles and
//! self-references; each definition is visited at most once.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::component::{ComponentDefinition, DefinitionId};

/// Tag name → definition. The first registration of a tag name wins.
pub type TagNameMap = IndexMap<String, Arc<ComponentDefinition>>;

/// Adds `definition` and everything it transitively depends on to `map`.
///
/// Definitions without a tag name are traversed but not registered, since
/// they cannot appear as nested elements. Returns the number of tag names
/// newly registered.
pub fn build_map(definition: &Arc<ComponentDefinition>, map: &mut TagNameMap) -> usize {
    let mut visited = HashSet::new();
    let before = map.len();
    visit(definition, map, &mut visited);
    let added = map.len() - before;
    if added > 0 {
        tracing::debug!(added, total = map.len(), "dependency map extended");
    }
    added
}

fn visit(
    definition: &Arc<ComponentDefinition>,
    map: &mut TagNameMap,
    visited: &mut HashSet<DefinitionId>,
) {
    if !visited.insert(definition.id()) {
        return;
    }
    if let Some(tag) = definition.tag_name() {
        map.entry(tag.to_string())
            .or_insert_with(|| definition.clone());
    }
    for dependency in definition.dependencies() {
        visit(dependency, map, visited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(tag: &str) -> Arc<ComponentDefinition> {
        ComponentDefinition::builder().tag_name(tag).build()
    }

    #[test]
    fn test_cycle_terminates() {
        let a = named("x-a");
        let b = ComponentDefinition::builder()
            .tag_name("x-b")
            .dependency(a.clone())
            .build();
        a.set_dependencies(vec![b.clone()]).unwrap();

        let mut map = TagNameMap::new();
        assert_eq!(build_map(&a, &mut map), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["x-a", "x-b"]);
        assert_eq!(map["x-a"].id(), a.id());
        assert_eq!(map["x-b"].id(), b.id());
    }

    #[test]
    fn test_self_reference() {
        let a = named("x-self");
        a.set_dependencies(vec![a.clone()]).unwrap();
        let mut map = TagNameMap::new();
        assert_eq!(build_map(&a, &mut map), 1);
    }

    #[test]
    fn test_first_registration_wins() {
        let first = named("x-dup");
        let second = named("x-dup");
        let root = ComponentDefinition::builder()
            .tag_name("x-root")
            .dependencies(vec![first.clone(), second])
            .build();

        let mut map = TagNameMap::new();
        build_map(&root, &mut map);
        assert_eq!(map.len(), 2);
        assert_eq!(map["x-dup"].id(), first.id());
    }

    #[test]
    fn test_accumulates_across_calls() {
        let a = named("x-a");
        let b = named("x-b");
        let mut map = TagNameMap::new();
        assert_eq!(build_map(&a, &mut map), 1);
        assert_eq!(build_map(&b, &mut map), 1);
        assert_eq!(build_map(&a, &mut map), 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_anonymous_definitions_are_traversed() {
        let leaf = named("x-leaf");
        let anonymous = ComponentDefinition::builder().dependency(leaf).build();
        let mut map = TagNameMap::new();
        assert_eq!(build_map(&anonymous, &mut map), 1);
        assert!(map.contains_key("x-leaf"));
    }

    #[test]
    fn test_diamond_visits_once() {
        let shared = named("x-shared");
        let left = ComponentDefinition::builder().tag_name("x-left").dependency(shared.clone()).build();
        let right = ComponentDefinition::builder().tag_name("x-right").dependency(shared).build();
        let root = ComponentDefinition::builder()
            .tag_name("x-root")
            .dependencies(vec![left, right])
            .build();
        let mut map = TagNameMap::new();
        assert_eq!(build_map(&root, &mut map), 4);
    }
}
