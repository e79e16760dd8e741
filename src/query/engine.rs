//! Query engine implementation
//!
//! Provides the seven fixed query operations over a borrowed graph:
//! - Entity lookup by ID
//! - Related entities (one relation kind, or all kinds in canonical order)
//! - Forward dependencies (imports → calls → references)
//! - Reverse dependencies and implementors (full scans)
//! - Containment
//! - Case-insensitive text search over name, path and ID
//!
//! Every handler yields an ordered list of matching IDs. The engine then
//! materializes copies of the stored records, up to the result cap.

use std::collections::HashSet;
use crate::entity::Entity;
use crate::graph::EntityGraph;
use crate::query::request::{QueryKind, QueryRequest};
use crate::relation::RelationKind;
use crate::{Error, Result};

pub const DEFAULT_MAX_RESULTS: usize = 100;
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Server-side bounds applied to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Result ceiling; also the default when a request leaves the cap unset
    pub max_results: usize,
    /// Deepest traversal a request may ask for
    pub max_depth: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl QueryLimits {
    pub fn new(max_results: usize, max_depth: usize) -> Self {
        Self { max_results, max_depth }
    }

    /// Requested cap if it lies in (0, ceiling], otherwise the ceiling
    pub fn effective_cap(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) if n > 0 && (n as u64) <= self.max_results as u64 => n as usize,
            _ => self.max_results,
        }
    }

    /// Requested depth clamped to [1, max_depth]
    pub fn effective_depth(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) if n > 1 => (n as u64).min(self.max_depth.max(1) as u64) as usize,
            _ => 1,
        }
    }
}

/// Capped results of one query.
///
/// IDs that resolve to no stored entity count toward `total` but do not
/// take a slot under the cap; later stored IDs fill it instead.
#[derive(Debug, Clone, Default)]
pub struct Matches {
    pub entities: Vec<Entity>,
    /// Every matched ID, including those beyond the cap or not stored
    pub total: usize,
}

/// Query engine over a borrowed graph.
///
/// Callers hold the graph's read lock for the engine's whole lifetime, so
/// a query sees one consistent state from scan to materialization.
pub struct QueryEngine<'a> {
    graph: &'a EntityGraph,
    limits: QueryLimits,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine
    pub fn new(graph: &'a EntityGraph, limits: QueryLimits) -> Self {
        Self { graph, limits }
    }

    /// Run one request
    pub fn execute(&self, req: &QueryRequest) -> Result<Matches> {
        let cap = self.limits.effective_cap(req.max_results);
        let depth = self.limits.effective_depth(req.depth);
        let target = req.entity_id();

        let ids = match &req.kind {
            QueryKind::Entity => self.entity(target)?,
            QueryKind::Related => self.related(target, req.relation.as_deref(), depth)?,
            QueryKind::DependsOn => self.depends_on(target, depth)?,
            QueryKind::DependedBy => self.depended_by(target, depth),
            QueryKind::Implements => self.implementors(target, depth),
            QueryKind::Contains => self.contains(target, depth)?,
            QueryKind::Search => self.search(req.search_text()),
            QueryKind::Unknown(kind) => return Err(Error::UnknownQueryType(kind.clone())),
        };

        Ok(Matches {
            entities: self.materialize(&ids, cap, req.include_full_facts),
            total: ids.len(),
        })
    }

    /// Exact lookup by ID
    pub fn entity(&self, id: &str) -> Result<Vec<String>> {
        let entity = self.require(id)?;
        Ok(vec![entity.id.clone()])
    }

    /// Targets of one relation kind, or of every kind in canonical order
    ///
    /// An unrecognized relation filter matches nothing.
    pub fn related(&self, id: &str, relation: Option<&str>, depth: usize) -> Result<Vec<String>> {
        self.require(id)?;

        let kinds: Vec<RelationKind> = match relation.filter(|r| !r.is_empty()) {
            Some(name) => match name.parse::<RelationKind>() {
                Ok(kind) => vec![kind],
                Err(e) => {
                    tracing::debug!(error = %e, "related query with unknown relation filter");
                    return Ok(Vec::new());
                }
            },
            None => RelationKind::all().to_vec(),
        };

        Ok(self.traverse_forward(id, &kinds, depth))
    }

    /// What the entity depends on: imports, then calls, then references
    pub fn depends_on(&self, id: &str, depth: usize) -> Result<Vec<String>> {
        self.require(id)?;
        Ok(self.traverse_forward(id, RelationKind::dependencies(), depth))
    }

    /// Entities whose imports, calls or references include `target`
    pub fn depended_by(&self, target: &str, depth: usize) -> Vec<String> {
        self.traverse_reverse(target, RelationKind::dependencies(), depth)
    }

    /// Entities implementing `target`
    pub fn implementors(&self, target: &str, depth: usize) -> Vec<String> {
        self.traverse_reverse(target, &[RelationKind::Implements], depth)
    }

    /// Entities directly (or transitively, with depth) contained by `id`
    pub fn contains(&self, id: &str, depth: usize) -> Result<Vec<String>> {
        self.require(id)?;
        Ok(self.traverse_forward(id, &[RelationKind::Contains], depth))
    }

    /// Case-insensitive substring match against name, path and ID
    pub fn search(&self, text: &str) -> Vec<String> {
        let needle = text.to_lowercase();

        self.graph
            .entities()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.path.to_lowercase().contains(&needle)
                    || e.id.to_lowercase().contains(&needle)
            })
            .map(|e| e.id.clone())
            .collect()
    }

    fn require(&self, id: &str) -> Result<&'a Entity> {
        self.graph
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Outgoing traversal.
    ///
    /// With a single hop the result is the plain concatenation of the start
    /// entity's lists for `kinds`, in order and without dedup. Deeper
    /// traversals walk breadth-first and return each reachable ID once,
    /// excluding the start.
    fn traverse_forward(&self, start: &str, kinds: &[RelationKind], depth: usize) -> Vec<String> {
        let Some(origin) = self.graph.get(start) else {
            return Vec::new();
        };

        if depth <= 1 {
            return kinds
                .iter()
                .flat_map(|kind| origin.relation(*kind).iter().cloned())
                .collect();
        }

        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut results = Vec::new();
        let mut frontier = vec![origin];

        for _ in 0..depth {
            let mut next = Vec::new();

            for entity in frontier {
                for kind in kinds {
                    for target in entity.relation(*kind) {
                        if !visited.insert(target.as_str()) {
                            continue;
                        }
                        results.push(target.clone());
                        if let Some(found) = self.graph.get(target) {
                            next.push(found);
                        }
                    }
                }
            }

            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        results
    }

    /// Incoming traversal by full scan.
    ///
    /// Each hop scans every entity in ingestion order and keeps those with a
    /// `kinds` edge into the current frontier, each at most once. Beyond one
    /// hop the target itself is excluded.
    fn traverse_reverse(&self, target: &str, kinds: &[RelationKind], depth: usize) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        if depth > 1 {
            visited.insert(target);
        }

        let mut results = Vec::new();
        let mut frontier: HashSet<&str> = HashSet::from([target]);

        for _ in 0..depth.max(1) {
            let mut next = HashSet::new();

            for entity in self.graph.entities() {
                if visited.contains(entity.id.as_str()) {
                    continue;
                }
                let hit = kinds.iter().any(|kind| {
                    entity
                        .relation(*kind)
                        .iter()
                        .any(|t| frontier.contains(t.as_str()))
                });
                if hit {
                    visited.insert(entity.id.as_str());
                    results.push(entity.id.clone());
                    next.insert(entity.id.as_str());
                }
            }

            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        results
    }

    /// Copies of the first `cap` stored entities among `ids`
    fn materialize(&self, ids: &[String], cap: usize, include_facts: bool) -> Vec<Entity> {
        ids.iter()
            .filter_map(|id| self.graph.get(id))
            .take(cap)
            .map(|e| e.snapshot(include_facts))
            .collect()
    }
}
