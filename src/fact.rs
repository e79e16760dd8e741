//! Facts - subject/predicate/object statements
//!
//! Producers describe entities as flat lists of facts. The projection table
//! below maps the predicates this crate understands onto entity fields;
//! everything else is carried along untouched and otherwise ignored.

use crate::relation::RelationKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single subject-predicate-object statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub subject: String,
    pub predicate: String,
    /// Dynamically typed object (string, list of strings, number, ...)
    pub object: Value,
}

impl Fact {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: impl Into<Value>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// The object as a string, if it is one
    pub fn object_str(&self) -> Option<&str> {
        self.object.as_str()
    }

    /// The object as a list of strings.
    ///
    /// A string object yields one element; an array yields its string
    /// elements in order. Anything else yields nothing.
    pub fn object_strings(&self) -> Vec<&str> {
        match &self.object {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Canonical predicate names
pub mod predicates {
    pub const TYPE: &str = "code.artifact.type";
    pub const TITLE: &str = "dc.terms.title";
    pub const PATH: &str = "code.artifact.path";
    pub const PACKAGE: &str = "code.artifact.package";
    pub const CONTAINS: &str = "code.structure.contains";
    pub const BELONGS: &str = "code.structure.belongs";
    pub const IMPORTS: &str = "code.dependency.imports";
    pub const IMPLEMENTS: &str = "code.relationship.implements";
    pub const EMBEDS: &str = "code.relationship.embeds";
    pub const EXTENDS: &str = "code.relationship.extends";
    pub const CALLS: &str = "code.relationship.calls";
    pub const REFERENCES: &str = "code.relationship.references";
}

/// Entity field a predicate projects onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Kind,
    Name,
    Path,
    Package,
    Relation(RelationKind),
}

/// Look up the field a predicate sets.
///
/// The `code.` namespace prefix is optional. Returns `None` for predicates
/// outside the table.
pub fn project(predicate: &str) -> Option<Field> {
    let local = predicate.strip_prefix("code.").unwrap_or(predicate);
    let field = match local {
        "artifact.type" => Field::Kind,
        "dc.terms.title" => Field::Name,
        "artifact.path" => Field::Path,
        "artifact.package" => Field::Package,
        "structure.contains" => Field::Relation(RelationKind::Contains),
        "structure.belongs" => Field::Relation(RelationKind::BelongsTo),
        "dependency.imports" => Field::Relation(RelationKind::Imports),
        "relationship.implements" => Field::Relation(RelationKind::Implements),
        "relationship.embeds" | "relationship.extends" => Field::Relation(RelationKind::Embeds),
        "relationship.calls" => Field::Relation(RelationKind::Calls),
        "relationship.references" => Field::Relation(RelationKind::References),
        _ => return None,
    };
    Some(field)
}
