//! Entity records - the materialized projection of an entity's facts

use crate::fact::{self, Fact, Field};
use crate::relation::RelationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in the knowledge graph.
///
/// Scalar attributes and relationship lists are derived from the facts the
/// entity was ingested with. Records handed out by queries are copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier (primary key)
    pub id: String,
    /// Entity kind (function, struct, file, ...)
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// File path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Owning package
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package: String,
    /// Related entity IDs by relationship kind, first-seen order, no duplicates
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub related: BTreeMap<RelationKind, Vec<String>>,
    /// Originating facts; stripped from query results unless requested
    #[serde(default, alias = "triples", skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Create an empty entity with only an ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: String::new(),
            name: String::new(),
            path: String::new(),
            package: String::new(),
            related: BTreeMap::new(),
            facts: Vec::new(),
            updated_at: None,
        }
    }

    /// Build an entity by projecting its facts.
    ///
    /// Only facts whose subject is `id` contribute. Unknown predicates and
    /// objects of the wrong shape are skipped. The full fact list is retained.
    pub fn from_facts(id: impl Into<String>, facts: Vec<Fact>, updated_at: Option<DateTime<Utc>>) -> Self {
        let mut entity = Self::new(id);

        for f in &facts {
            if f.subject != entity.id {
                continue;
            }
            let Some(field) = fact::project(&f.predicate) else {
                continue;
            };

            match field {
                Field::Relation(kind) => {
                    for target in f.object_strings() {
                        entity.push_relation(kind, target);
                    }
                }
                scalar => {
                    if let Some(value) = f.object_str() {
                        entity.set_scalar(scalar, value);
                    }
                }
            }
        }

        entity.facts = facts;
        entity.updated_at = updated_at;
        entity
    }

    fn set_scalar(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Kind => &mut self.kind,
            Field::Name => &mut self.name,
            Field::Path => &mut self.path,
            Field::Package => &mut self.package,
            Field::Relation(_) => return,
        };
        *slot = value.to_string();
    }

    /// Append a relation target unless already present
    pub fn push_relation(&mut self, kind: RelationKind, target: impl Into<String>) {
        let target = target.into();
        let targets = self.related.entry(kind).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Set the kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a relation target
    pub fn with_relation(mut self, kind: RelationKind, target: impl Into<String>) -> Self {
        self.push_relation(kind, target);
        self
    }

    /// Targets of one relation kind
    pub fn relation(&self, kind: RelationKind) -> &[String] {
        self.related.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Copy of this record, with the fact payload dropped unless requested
    pub fn snapshot(&self, include_facts: bool) -> Self {
        if include_facts {
            return self.clone();
        }
        Self {
            id: self.id.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            path: self.path.clone(),
            package: self.package.clone(),
            related: self.related.clone(),
            facts: Vec::new(),
            updated_at: self.updated_at,
        }
    }
}
