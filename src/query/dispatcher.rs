//! Query Dispatcher - stateless façade over the shared graph

use crate::graph::SharedGraph;
use crate::query::engine::{QueryEngine, QueryLimits};
use crate::query::request::{QueryRequest, QueryResponse};
use std::time::Instant;

/// Answers query requests against the shared graph.
///
/// Every request gets a well-formed response; failures travel inside the
/// envelope (`success: false`).
#[derive(Clone)]
pub struct QueryDispatcher {
    graph: SharedGraph,
    limits: QueryLimits,
}

impl QueryDispatcher {
    pub fn new(graph: SharedGraph, limits: QueryLimits) -> Self {
        Self { graph, limits }
    }

    pub fn limits(&self) -> QueryLimits {
        self.limits
    }

    /// Execute one request.
    ///
    /// The read lock is held from the first lookup until the result copies
    /// are made. Once started, a query runs to completion.
    pub fn dispatch(&self, req: &QueryRequest) -> QueryResponse {
        let start = Instant::now();

        let outcome = {
            let graph = self.graph.read();
            let engine = QueryEngine::new(&graph, self.limits);
            engine.execute(req)
        };

        let mut resp = match outcome {
            Ok(matches) => QueryResponse::ok(&req.request_id, matches.entities, matches.total),
            Err(e) => QueryResponse::error(&req.request_id, e.to_string()),
        };
        resp.query_time = start.elapsed();

        tracing::debug!(
            request = %req.request_id,
            kind = %req.kind,
            success = resp.success,
            returned = resp.entities.len(),
            total = resp.total_count,
            elapsed_us = resp.query_time.as_micros() as u64,
            "query executed"
        );

        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::graph::EntityGraph;
    use crate::query::request::QueryKind;

    #[test]
    fn test_dispatch_not_found_envelope() {
        let dispatcher = QueryDispatcher::new(EntityGraph::new().shared(), QueryLimits::default());

        let resp = dispatcher.dispatch(&QueryRequest::entity("r1", QueryKind::Entity, "missing"));

        assert_eq!(resp.request_id, "r1");
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("entity not found"));
        assert_eq!(resp.total_count, 0);
    }

    #[test]
    fn test_dispatch_unknown_kind_envelope() {
        let dispatcher = QueryDispatcher::new(EntityGraph::new().shared(), QueryLimits::default());

        let resp = dispatcher.dispatch(&QueryRequest::new("r2", "neighbours"));

        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("unknown query type: neighbours"));
    }

    #[test]
    fn test_dispatch_sees_writes_through_shared_graph() {
        let graph = EntityGraph::new().shared();
        let dispatcher = QueryDispatcher::new(graph.clone(), QueryLimits::default());

        graph.write().put(Entity::new("a").with_name("Alpha"));

        let resp = dispatcher.dispatch(&QueryRequest::entity("r3", QueryKind::Entity, "a"));
        assert!(resp.success);
        assert_eq!(resp.ids(), ["a"]);
        assert_eq!(resp.total_count, 1);
    }

    #[test]
    fn test_empty_results_are_success() {
        let dispatcher = QueryDispatcher::new(EntityGraph::new().shared(), QueryLimits::default());

        let resp = dispatcher.dispatch(&QueryRequest::entity("r4", QueryKind::DependedBy, "x"));
        assert!(resp.success);
        assert!(resp.entities.is_empty());
        assert_eq!(resp.total_count, 0);
    }
}
