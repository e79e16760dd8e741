//! Inverted index - attribute value → entity IDs
//!
//! Four scalar tables (type, package, name, path) and one relation table
//! (kind → source → targets). The index only grows: entries contributed by
//! an earlier version of a re-ingested entity are not retracted.

use crate::entity::Entity;
use crate::relation::RelationKind;
use serde::Serialize;
use std::collections::HashMap;

/// Scalar attribute tables that can be looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Type,
    Package,
    Name,
    Path,
}

impl std::str::FromStr for ScalarField {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "type" | "kind" => Ok(ScalarField::Type),
            "package" | "pkg" => Ok(ScalarField::Package),
            "name" => Ok(ScalarField::Name),
            "path" => Ok(ScalarField::Path),
            _ => Err(crate::Error::UnknownField(s.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InvertedIndex {
    by_type: HashMap<String, Vec<String>>,
    by_package: HashMap<String, Vec<String>>,
    by_name: HashMap<String, Vec<String>>,
    by_path: HashMap<String, Vec<String>>,
    by_relation: HashMap<RelationKind, HashMap<String, Vec<String>>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity's attributes and relations.
    ///
    /// Scalar memberships are appended (deduplicated). For each relation kind
    /// the entity carries, the source's target list is overwritten; kinds the
    /// entity no longer carries keep whatever was recorded before.
    pub fn extend(&mut self, entity: &Entity) {
        let id = &entity.id;

        append_unique(&mut self.by_type, &entity.kind, id);
        append_unique(&mut self.by_package, &entity.package, id);
        append_unique(&mut self.by_name, &entity.name, id);
        append_unique(&mut self.by_path, &entity.path, id);

        for (kind, targets) in &entity.related {
            self.by_relation
                .entry(*kind)
                .or_default()
                .insert(id.clone(), targets.clone());
        }
    }

    /// IDs having the given value in a scalar table
    pub fn lookup(&self, field: ScalarField, value: &str) -> &[String] {
        let table = match field {
            ScalarField::Type => &self.by_type,
            ScalarField::Package => &self.by_package,
            ScalarField::Name => &self.by_name,
            ScalarField::Path => &self.by_path,
        };
        table.get(value).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn by_type(&self, kind: &str) -> &[String] {
        self.lookup(ScalarField::Type, kind)
    }

    pub fn by_package(&self, package: &str) -> &[String] {
        self.lookup(ScalarField::Package, package)
    }

    pub fn by_name(&self, name: &str) -> &[String] {
        self.lookup(ScalarField::Name, name)
    }

    pub fn by_path(&self, path: &str) -> &[String] {
        self.lookup(ScalarField::Path, path)
    }

    /// Targets recorded for `source` under `kind`
    pub fn related_ids(&self, kind: RelationKind, source: &str) -> &[String] {
        self.by_relation
            .get(&kind)
            .and_then(|sources| sources.get(source))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            types: self.by_type.len(),
            packages: self.by_package.len(),
            names: self.by_name.len(),
            paths: self.by_path.len(),
            relation_edges: self
                .by_relation
                .values()
                .flat_map(|sources| sources.values())
                .map(|targets| targets.len())
                .sum(),
        }
    }
}

fn append_unique(table: &mut HashMap<String, Vec<String>>, value: &str, id: &str) {
    if value.is_empty() {
        return;
    }
    let ids = table.entry(value.to_string()).or_default();
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

/// Distinct values per scalar table plus total relation edges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub types: usize,
    pub packages: usize,
    pub names: usize,
    pub paths: usize,
    pub relation_edges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(id: &str) -> Entity {
        Entity::new(id).with_kind("struct").with_name("Handler")
    }

    #[test]
    fn test_scalar_tables_keep_insertion_order() {
        let mut index = InvertedIndex::new();
        index.extend(&handler("b"));
        index.extend(&handler("a"));
        index.extend(&handler("b"));

        assert_eq!(index.by_type("struct"), ["b", "a"]);
        assert_eq!(index.by_name("Handler"), ["b", "a"]);
        assert!(index.by_package("").is_empty());
        assert!(index.by_path("missing").is_empty());
    }

    #[test]
    fn test_empty_values_are_not_indexed() {
        let mut index = InvertedIndex::new();
        index.extend(&Entity::new("bare"));

        assert_eq!(index.stats(), IndexStats::default());
    }

    #[test]
    fn test_relation_table_overwrites_present_kinds_only() {
        let mut index = InvertedIndex::new();
        index.extend(
            &Entity::new("a")
                .with_relation(RelationKind::Calls, "x")
                .with_relation(RelationKind::Imports, "y"),
        );
        index.extend(&Entity::new("a").with_relation(RelationKind::Calls, "z"));

        assert_eq!(index.related_ids(RelationKind::Calls, "a"), ["z"]);
        // Stale: the second version dropped its imports.
        assert_eq!(index.related_ids(RelationKind::Imports, "a"), ["y"]);
        assert_eq!(index.stats().relation_edges, 2);
    }

    #[test]
    fn test_scalar_field_parse() {
        assert_eq!("kind".parse::<ScalarField>().unwrap(), ScalarField::Type);
        assert_eq!("PATH".parse::<ScalarField>().unwrap(), ScalarField::Path);
        assert!("owner".parse::<ScalarField>().is_err());
    }
}
