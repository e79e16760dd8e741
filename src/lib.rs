//! # Factgraph - in-memory knowledge graph of software entities
//!
//! Entities (modules, types, functions, files) arrive as batches of
//! subject/predicate/object facts. Each batch fully replaces the stored
//! entity and extends an append-only inverted index. Seven structural
//! queries run against the graph while ingestion continues.
//!
//! Factgraph provides:
//! - Fact projection onto typed entity fields and relation lists
//! - Entity store with an inverted index by type, package, name, path and relation
//! - Query dispatcher with result caps and optional transitive traversal
//! - Channel and JSON-lines transports plus an HTTP surface

pub mod relation;
pub mod fact;
pub mod entity;
pub mod index;
pub mod graph;
pub mod ingest;
pub mod query;
pub mod transport;
pub mod service;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use relation::RelationKind;
pub use fact::Fact;
pub use entity::Entity;
pub use index::{InvertedIndex, ScalarField};
pub use graph::{EntityGraph, SharedGraph};
pub use ingest::{Applied, EntityUpdate, IngestAdapter};
pub use query::{
    Matches, QueryDispatcher, QueryEngine, QueryKind, QueryLimits, QueryRequest, QueryResponse,
};
pub use service::GraphService;
pub use config::GraphConfig;

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for graph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Message text is part of the query response contract
    #[error("entity not found")]
    NotFound(String),

    #[error("unknown query type: {0}")]
    UnknownQueryType(String),

    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    #[error("unknown index field: {0}")]
    UnknownField(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
