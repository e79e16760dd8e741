//! Graph service - one instance owning the shared graph and both pipelines
//!
//! The ingestion loop and the query loop run as independent tasks against
//! the same [`SharedGraph`]. Stopping the service halts both loops; any
//! update or query already holding the lock finishes first.

use crate::config::GraphConfig;
use crate::entity::Entity;
use crate::graph::{EntityGraph, GraphStats, SharedGraph};
use crate::index::ScalarField;
use crate::ingest::{Applied, EntityUpdate, IngestAdapter};
use crate::query::{QueryDispatcher, QueryLimits, QueryRequest, QueryResponse};
use crate::transport::{IngestSource, QueryChannel};
use crate::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Counters kept alongside the graph
#[derive(Debug, Default)]
struct Counters {
    events_applied: AtomicU64,
    events_dropped: AtomicU64,
    queries_processed: AtomicU64,
    last_query: Mutex<Option<DateTime<Utc>>>,
}

pub struct GraphService {
    graph: SharedGraph,
    ingest: IngestAdapter,
    dispatcher: QueryDispatcher,
    counters: Counters,
}

impl GraphService {
    pub fn new(limits: QueryLimits) -> Self {
        let graph = EntityGraph::new().shared();
        Self {
            ingest: IngestAdapter::new(graph.clone()),
            dispatcher: QueryDispatcher::new(graph.clone(), limits),
            graph,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.limits())
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn limits(&self) -> QueryLimits {
        self.dispatcher.limits()
    }

    /// Apply one decoded update
    pub fn ingest(&self, update: EntityUpdate) -> Applied {
        let applied = self.ingest.apply(update);
        self.counters.events_applied.fetch_add(1, Ordering::Relaxed);
        applied
    }

    /// Decode and apply one payload; malformed payloads are counted and dropped
    pub fn ingest_raw(&self, payload: &[u8]) -> Result<Applied> {
        let outcome = self.ingest.apply_raw(payload);
        let counter = if outcome.is_ok() {
            &self.counters.events_applied
        } else {
            &self.counters.events_dropped
        };
        counter.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    /// Answer one query
    pub fn query(&self, req: &QueryRequest) -> QueryResponse {
        self.counters.queries_processed.fetch_add(1, Ordering::Relaxed);
        *self.counters.last_query.lock() = Some(Utc::now());
        self.dispatcher.dispatch(req)
    }

    /// Copy of a stored entity
    pub fn entity(&self, id: &str, include_facts: bool) -> Option<Entity> {
        self.graph.read().get(id).map(|e| e.snapshot(include_facts))
    }

    /// IDs holding `value` in one of the scalar index tables
    pub fn lookup(&self, field: ScalarField, value: &str) -> Vec<String> {
        self.graph.read().lookup(field, value).to_vec()
    }

    pub fn entity_count(&self) -> usize {
        self.graph.read().len()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            graph: self.graph.read().stats(),
            events_applied: self.counters.events_applied.load(Ordering::Relaxed),
            events_dropped: self.counters.events_dropped.load(Ordering::Relaxed),
            queries_processed: self.counters.queries_processed.load(Ordering::Relaxed),
            last_query: *self.counters.last_query.lock(),
        }
    }

    /// Ingest a whole source before anything else is served.
    ///
    /// Returns once the source is exhausted, so queries issued afterwards see
    /// every update. `on_event` runs after each payload.
    pub async fn replay<S, F>(&self, mut source: S, mut on_event: F) -> ReplayTotals
    where
        S: IngestSource,
        F: FnMut(),
    {
        let mut totals = ReplayTotals::default();
        while let Some(payload) = source.recv().await {
            match self.ingest_raw(&payload) {
                Ok(_) => totals.applied += 1,
                Err(_) => totals.dropped += 1,
            }
            on_event();
        }
        tracing::info!(applied = totals.applied, dropped = totals.dropped, "replay finished");
        totals
    }

    /// Drain an ingestion source until it is exhausted or `stop` fires.
    ///
    /// Returns the number of payloads received.
    pub async fn run_ingestion<S>(&self, mut source: S, mut stop: watch::Receiver<bool>) -> u64
    where
        S: IngestSource,
    {
        tracing::info!("ingestion loop started");
        let mut received = 0u64;

        loop {
            let stopped = *stop.borrow();
            if stopped {
                break;
            }
            let payload = tokio::select! {
                payload = source.recv() => payload,
                _ = stop.changed() => break,
            };
            let Some(payload) = payload else {
                break;
            };
            received += 1;
            // Decode failures are already logged and counted.
            let _ = self.ingest_raw(&payload);
        }

        tracing::info!(received, entities = self.entity_count(), "ingestion loop stopped");
        received
    }

    /// Answer requests from a query channel until it closes or `stop` fires.
    ///
    /// Undecodable requests are logged and dropped; they carry no request ID
    /// to answer to.
    pub async fn run_queries<C>(&self, mut channel: C, mut stop: watch::Receiver<bool>) -> u64
    where
        C: QueryChannel,
    {
        tracing::info!("query loop started");
        let mut answered = 0u64;

        loop {
            let stopped = *stop.borrow();
            if stopped {
                break;
            }
            let payload = tokio::select! {
                payload = channel.recv() => payload,
                _ = stop.changed() => break,
            };
            let Some(payload) = payload else {
                break;
            };

            let req = match QueryRequest::decode(&payload) {
                Ok(req) => req,
                Err(e) => {
                    tracing::warn!(error = %e, "invalid query request");
                    continue;
                }
            };

            let resp = self.query(&req);
            if let Err(e) = channel.send(resp).await {
                tracing::warn!(error = %e, request = %req.request_id, "failed to publish query result");
                continue;
            }
            answered += 1;
        }

        tracing::info!(answered, "query loop stopped");
        answered
    }

    /// Spawn both intake loops
    pub fn start<S, C>(self: &Arc<Self>, source: S, channel: C) -> ServiceHandle
    where
        S: IngestSource + 'static,
        C: QueryChannel + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);

        let ingest_svc = Arc::clone(self);
        let ingest_stop = stop_rx.clone();
        let ingestion = tokio::spawn(async move { ingest_svc.run_ingestion(source, ingest_stop).await });

        let query_svc = Arc::clone(self);
        let queries = tokio::spawn(async move { query_svc.run_queries(channel, stop_rx).await });

        tracing::info!(max_results = self.limits().max_results, "graph service started");

        ServiceHandle {
            stop: stop_tx,
            ingestion,
            queries,
        }
    }
}

/// Running intake loops
pub struct ServiceHandle {
    stop: watch::Sender<bool>,
    ingestion: JoinHandle<u64>,
    queries: JoinHandle<u64>,
}

impl ServiceHandle {
    /// Signal both loops to stop and wait for them to finish
    pub async fn shutdown(self) -> Result<LoopTotals> {
        // Receivers may already be gone if both loops ended on their own.
        let _ = self.stop.send(true);
        self.join().await
    }

    /// Wait for both loops to end on their own (sources exhausted)
    pub async fn join(self) -> Result<LoopTotals> {
        let events = self.ingestion.await?;
        let queries = self.queries.await?;
        Ok(LoopTotals { events, queries })
    }
}

/// Outcome of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayTotals {
    pub applied: u64,
    pub dropped: u64,
}

/// Messages handled by each loop over its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTotals {
    pub events: u64,
    pub queries: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub graph: GraphStats,
    pub events_applied: u64,
    pub events_dropped: u64,
    pub queries_processed: u64,
    pub last_query: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{predicates, Fact};
    use crate::query::QueryKind;
    use crate::transport::{ChannelIngest, ChannelQueries};

    #[test]
    fn test_counters() {
        let svc = GraphService::new(QueryLimits::default());

        svc.ingest(EntityUpdate::new("a", vec![Fact::new("a", predicates::TITLE, "A")]));
        assert!(svc.ingest_raw(b"garbage").is_err());
        svc.query(&QueryRequest::search("r", "a"));

        let stats = svc.stats();
        assert_eq!(stats.events_applied, 1);
        assert_eq!(stats.events_dropped, 1);
        assert_eq!(stats.queries_processed, 1);
        assert!(stats.last_query.is_some());
        assert_eq!(stats.graph.entities, 1);
    }

    #[test]
    fn test_entity_copy_is_detached() {
        let svc = GraphService::new(QueryLimits::default());
        svc.ingest(EntityUpdate::new("a", vec![Fact::new("a", predicates::TITLE, "A")]));

        let mut copy = svc.entity("a", true).unwrap();
        copy.name = "mutated".to_string();

        assert_eq!(svc.entity("a", false).unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_loops_run_until_sources_close() {
        let svc = Arc::new(GraphService::new(QueryLimits::default()));
        let (ingest_tx, source) = ChannelIngest::new(8);
        let (mut client, channel) = ChannelQueries::new(8);
        let handle = svc.start(source, channel);

        ingest_tx
            .send(&EntityUpdate::new("a", vec![Fact::new("a", predicates::TYPE, "struct")]))
            .await
            .unwrap();
        ingest_tx.send_raw(b"not json".to_vec()).await.unwrap();
        drop(ingest_tx);

        // Wait for the write to land before querying
        while svc.entity_count() == 0 {
            tokio::task::yield_now().await;
        }

        let resp = client
            .call(&QueryRequest::entity("q1", QueryKind::Entity, "a"))
            .await
            .unwrap();
        assert!(resp.success);
        assert_eq!(resp.entities[0].kind, "struct");

        client.send_raw(b"{broken".to_vec()).await.unwrap();
        let resp = client
            .call(&QueryRequest::entity("q2", QueryKind::Entity, "zzz"))
            .await
            .unwrap();
        assert_eq!(resp.error.as_deref(), Some("entity not found"));

        drop(client);
        let totals = handle.join().await.unwrap();
        assert_eq!(totals.events, 2);
        assert_eq!(totals.queries, 2);
    }

    #[tokio::test]
    async fn test_replay_completes_before_queries_are_served() {
        use crate::transport::LineIngest;
        use tokio::io::BufReader;

        let mut events = Vec::new();
        for i in 0..2000 {
            let update = EntityUpdate::new(
                format!("h{i}"),
                vec![Fact::new(format!("h{i}"), predicates::TITLE, format!("Handler{i}"))],
            );
            events.extend(serde_json::to_vec(&update).unwrap());
            events.push(b'\n');
        }
        events.extend(b"{broken\n");

        let svc = Arc::new(GraphService::new(QueryLimits::default()));
        let mut ticks = 0;
        let totals = svc
            .replay(LineIngest::new(BufReader::new(events.as_slice())), || ticks += 1)
            .await;
        assert_eq!(totals, ReplayTotals { applied: 2000, dropped: 1 });
        assert_eq!(ticks, 2001);

        // Queries only start once the replay has returned
        let (mut client, channel) = ChannelQueries::new(4);
        let handle = svc.start(LineIngest::new(BufReader::new(tokio::io::empty())), channel);

        let resp = client.call(&QueryRequest::search("q1", "handler")).await.unwrap();
        assert_eq!(resp.total_count, 2000);
        assert_eq!(resp.entities.len(), 100);

        let totals = handle.shutdown().await.unwrap();
        assert_eq!(totals, LoopTotals { events: 0, queries: 1 });
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_loops() {
        let svc = Arc::new(GraphService::new(QueryLimits::default()));
        let (_ingest_tx, source) = ChannelIngest::new(1);
        let (_client, channel) = ChannelQueries::new(1);
        let handle = svc.start(source, channel);

        let totals = handle.shutdown().await.unwrap();
        assert_eq!(totals, LoopTotals { events: 0, queries: 0 });
    }
}
