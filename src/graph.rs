//! Entity Graph - the shared in-memory store and its inverted index
//!
//! One `EntityGraph` holds every ingested entity. It is shared between the
//! ingestion and query pipelines behind a single reader/writer lock
//! (see [`SharedGraph`]).

use crate::entity::Entity;
use crate::index::{IndexStats, InvertedIndex, ScalarField};
use crate::relation::RelationKind;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// The graph as shared between pipelines. Writers take the lock exclusively
/// per update; queries hold it shared for their whole execution.
pub type SharedGraph = Arc<RwLock<EntityGraph>>;

/// In-memory entity store plus inverted index.
#[derive(Debug, Default)]
pub struct EntityGraph {
    /// All entities by ID
    entities: HashMap<String, Entity>,
    /// IDs in first-ingestion order; full scans walk this
    order: Vec<String>,
    index: InvertedIndex,
}

impl EntityGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a graph for sharing between pipelines
    pub fn shared(self) -> SharedGraph {
        Arc::new(RwLock::new(self))
    }

    /// Insert or replace an entity by ID and extend the index.
    ///
    /// Returns `true` if an existing entity was replaced. A replaced entity
    /// keeps its position in scan order.
    pub fn put(&mut self, entity: Entity) -> bool {
        self.index.extend(&entity);

        let id = entity.id.clone();
        let replaced = self.entities.insert(id.clone(), entity).is_some();
        if !replaced {
            self.order.push(id);
        }
        replaced
    }

    /// Get an entity by ID
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in first-ingestion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// IDs of entities with the given kind
    pub fn by_type(&self, kind: &str) -> &[String] {
        self.index.by_type(kind)
    }

    /// IDs of entities in the given package
    pub fn by_package(&self, package: &str) -> &[String] {
        self.index.by_package(package)
    }

    /// IDs of entities with the given display name
    pub fn by_name(&self, name: &str) -> &[String] {
        self.index.by_name(name)
    }

    /// IDs of entities at the given path
    pub fn by_path(&self, path: &str) -> &[String] {
        self.index.by_path(path)
    }

    pub fn lookup(&self, field: ScalarField, value: &str) -> &[String] {
        self.index.lookup(field, value)
    }

    /// Targets recorded in the relation table for `source`
    pub fn related_ids(&self, kind: RelationKind, source: &str) -> &[String] {
        self.index.related_ids(kind, source)
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            entities: self.entities.len(),
            index: self.index.stats(),
        }
    }
}

/// Statistics about an entity graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub entities: usize,
    pub index: IndexStats,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Entity Graph Statistics:")?;
        writeln!(f, "  Entities: {}", self.entities)?;
        writeln!(
            f,
            "  Index: {} types, {} packages, {} names, {} paths",
            self.index.types, self.index.packages, self.index.names, self.index.paths
        )?;
        writeln!(f, "  Relation edges: {}", self.index.relation_edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut graph = EntityGraph::new();
        let replaced = graph.put(Entity::new("a").with_name("Alpha"));

        assert!(!replaced);
        assert_eq!(graph.get("a").unwrap().name, "Alpha");
        assert!(graph.get("b").is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_replace_keeps_scan_position() {
        let mut graph = EntityGraph::new();
        graph.put(Entity::new("a"));
        graph.put(Entity::new("b"));
        let replaced = graph.put(Entity::new("a").with_name("again"));

        assert!(replaced);
        let ids: Vec<_> = graph.entities().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(graph.get("a").unwrap().name, "again");
    }

    #[test]
    fn test_scalar_index_is_append_only() {
        let mut graph = EntityGraph::new();
        graph.put(Entity::new("a").with_kind("struct"));
        graph.put(Entity::new("a").with_kind("interface"));

        assert_eq!(graph.by_type("struct"), ["a"]);
        assert_eq!(graph.by_type("interface"), ["a"]);
        assert_eq!(graph.get("a").unwrap().kind, "interface");
    }

    #[test]
    fn test_scalar_lookups() {
        let mut graph = EntityGraph::new();
        let mut entity = Entity::new("pkg.Load").with_kind("function");
        entity.package = "pkg".to_string();
        entity.path = "pkg/load.go".to_string();
        graph.put(entity);

        assert!(graph.get("pkg.Load").is_some());
        assert_eq!(graph.by_package("pkg"), ["pkg.Load"]);
        assert_eq!(graph.by_path("pkg/load.go"), ["pkg.Load"]);
        assert_eq!(graph.lookup(ScalarField::Type, "function"), ["pkg.Load"]);
        assert!(graph.by_name("Load").is_empty());
    }

    #[test]
    fn test_stats() {
        let mut graph = EntityGraph::new();
        graph.put(
            Entity::new("a")
                .with_kind("file")
                .with_relation(RelationKind::Contains, "b")
                .with_relation(RelationKind::Contains, "c"),
        );
        graph.put(Entity::new("b").with_kind("function"));

        let stats = graph.stats();
        assert_eq!(stats.entities, 2);
        assert_eq!(stats.index.types, 2);
        assert_eq!(stats.index.relation_edges, 2);
        assert!(stats.to_string().contains("Entities: 2"));
    }
}
