//! Ingestion Adapter
//!
//! Turns entity-update events into store records. Each event carries the
//! complete replacement fact list for one entity; applying it replaces the
//! stored record wholesale and extends the index.

use crate::entity::Entity;
use crate::fact::Fact;
use crate::graph::SharedGraph;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entity-update event as delivered by the ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub id: String,
    #[serde(default, alias = "triples")]
    pub facts: Vec<Fact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityUpdate {
    pub fn new(id: impl Into<String>, facts: Vec<Fact>) -> Self {
        Self {
            id: id.into(),
            facts,
            updated_at: Some(Utc::now()),
        }
    }

    /// Decode an event from its JSON wire form
    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|source| Error::Decode {
            what: "entity update",
            source,
        })
    }

    /// Project the event's facts into a store record
    pub fn into_entity(self) -> Entity {
        Entity::from_facts(self.id, self.facts, self.updated_at)
    }
}

/// Outcome of applying one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
}

/// Writes entity updates into the shared graph.
#[derive(Clone)]
pub struct IngestAdapter {
    graph: SharedGraph,
}

impl IngestAdapter {
    pub fn new(graph: SharedGraph) -> Self {
        Self { graph }
    }

    /// Apply a decoded update. The write lock is held for this one update.
    pub fn apply(&self, update: EntityUpdate) -> Applied {
        let entity = update.into_entity();
        let id = entity.id.clone();
        let relations: usize = entity.related.values().map(Vec::len).sum();

        let replaced = self.graph.write().put(entity);

        let applied = if replaced {
            Applied::Replaced
        } else {
            Applied::Inserted
        };
        tracing::debug!(entity = %id, relations, ?applied, "indexed entity");
        applied
    }

    /// Decode and apply a raw payload.
    ///
    /// Malformed payloads are logged and dropped; the error is returned so
    /// callers can count it, never retried here.
    pub fn apply_raw(&self, payload: &[u8]) -> Result<Applied> {
        match EntityUpdate::decode(payload) {
            Ok(update) => Ok(self.apply(update)),
            Err(e) => {
                tracing::warn!(error = %e, bytes = payload.len(), "invalid entity message");
                Err(e)
            }
        }
    }
}
