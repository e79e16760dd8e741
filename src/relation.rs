//! Relation kinds - the directed edges between entities
//!
//! Every relationship an entity can carry reduces to one of seven kinds:
//! - `Contains`: parent → child (file → function)
//! - `BelongsTo`: child → parent (function → file)
//! - `Imports`: entity → imported entity
//! - `Implements`: type → interface
//! - `Embeds`: struct → embedded/extended struct
//! - `Calls`: callable → callable
//! - `References`: entity → any referenced entity

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Relationship kinds between entities.
///
/// The declaration order is the canonical iteration order used whenever
/// "all relations" of an entity are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Parent contains a child element
    Contains,
    /// Child belongs to a parent element
    BelongsTo,
    /// Entity imports another entity
    Imports,
    /// Type implements an interface
    Implements,
    /// Struct embeds or extends another struct
    Embeds,
    /// Callable calls another callable
    Calls,
    /// Entity references another entity (any usage)
    References,
}

impl RelationKind {
    /// Get the string representation of the relation kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Contains => "contains",
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::Imports => "imports",
            RelationKind::Implements => "implements",
            RelationKind::Embeds => "embeds",
            RelationKind::Calls => "calls",
            RelationKind::References => "references",
        }
    }

    /// All relation kinds in canonical order
    pub fn all() -> &'static [RelationKind] {
        &[
            RelationKind::Contains,
            RelationKind::BelongsTo,
            RelationKind::Imports,
            RelationKind::Implements,
            RelationKind::Embeds,
            RelationKind::Calls,
            RelationKind::References,
        ]
    }

    /// Relations that make one entity depend on another, in dependency order
    pub fn dependencies() -> &'static [RelationKind] {
        &[
            RelationKind::Imports,
            RelationKind::Calls,
            RelationKind::References,
        ]
    }
}

impl FromStr for RelationKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" | "contain" => Ok(RelationKind::Contains),
            "belongs_to" | "belongs-to" | "belongs" => Ok(RelationKind::BelongsTo),
            "imports" | "import" => Ok(RelationKind::Imports),
            "implements" | "implement" => Ok(RelationKind::Implements),
            "embeds" | "embed" | "extends" => Ok(RelationKind::Embeds),
            "calls" | "call" => Ok(RelationKind::Calls),
            "references" | "reference" | "ref" => Ok(RelationKind::References),
            _ => Err(crate::Error::UnknownRelation(s.to_string())),
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_kind_roundtrip() {
        for kind in RelationKind::all() {
            let parsed: RelationKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_relation_kind_aliases() {
        assert_eq!(RelationKind::from_str("belongs-to").unwrap(), RelationKind::BelongsTo);
        assert_eq!(RelationKind::from_str("extends").unwrap(), RelationKind::Embeds);
        assert_eq!(RelationKind::from_str("CALLS").unwrap(), RelationKind::Calls);
        assert!(RelationKind::from_str("inherits").is_err());
    }

    #[test]
    fn test_dependency_order() {
        assert_eq!(
            RelationKind::dependencies(),
            &[RelationKind::Imports, RelationKind::Calls, RelationKind::References]
        );
        assert!(!RelationKind::dependencies().contains(&RelationKind::Implements));
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&RelationKind::BelongsTo).unwrap();
        assert_eq!(json, "\"belongs_to\"");
    }
}
