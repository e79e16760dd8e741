//! Query request/response envelope

use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The seven supported query operations.
///
/// Kinds are carried on the wire as plain strings; anything unrecognized
/// decodes to `Unknown` so the dispatcher can answer with an error envelope
/// instead of the request being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryKind {
    Entity,
    Related,
    DependsOn,
    DependedBy,
    Implements,
    Contains,
    Search,
    Unknown(String),
}

impl QueryKind {
    pub fn as_str(&self) -> &str {
        match self {
            QueryKind::Entity => "entity",
            QueryKind::Related => "related",
            QueryKind::DependsOn => "depends_on",
            QueryKind::DependedBy => "depended_by",
            QueryKind::Implements => "implements",
            QueryKind::Contains => "contains",
            QueryKind::Search => "search",
            QueryKind::Unknown(s) => s,
        }
    }
}

impl From<String> for QueryKind {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "entity" => QueryKind::Entity,
            "related" => QueryKind::Related,
            "depends_on" | "dependson" => QueryKind::DependsOn,
            "depended_by" | "dependedby" => QueryKind::DependedBy,
            "implements" => QueryKind::Implements,
            "contains" => QueryKind::Contains,
            "search" => QueryKind::Search,
            _ => QueryKind::Unknown(s),
        }
    }
}

impl From<&str> for QueryKind {
    fn from(s: &str) -> Self {
        QueryKind::from(s.to_string())
    }
}

impl From<QueryKind> for String {
    fn from(kind: QueryKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A graph query request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Correlates the response with this request
    pub request_id: String,
    #[serde(rename = "type")]
    pub kind: QueryKind,
    /// Target entity for entity-based queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Relation filter for related queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    /// Requested result cap; non-positive or oversized values fall back to the server ceiling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(default, alias = "include_triples")]
    pub include_full_facts: bool,
    /// Traversal depth for relationship queries (hops)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<i64>,
}

impl QueryRequest {
    pub fn new(request_id: impl Into<String>, kind: impl Into<QueryKind>) -> Self {
        Self {
            request_id: request_id.into(),
            kind: kind.into(),
            entity_id: None,
            relation: None,
            search_text: None,
            max_results: None,
            include_full_facts: false,
            depth: None,
        }
    }

    pub fn entity(request_id: impl Into<String>, kind: impl Into<QueryKind>, entity_id: impl Into<String>) -> Self {
        Self::new(request_id, kind).with_entity(entity_id)
    }

    pub fn search(request_id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut req = Self::new(request_id, QueryKind::Search);
        req.search_text = Some(text.into());
        req
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn with_max_results(mut self, max_results: i64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_facts(mut self) -> Self {
        self.include_full_facts = true;
        self
    }

    pub fn entity_id(&self) -> &str {
        self.entity_id.as_deref().unwrap_or("")
    }

    pub fn search_text(&self) -> &str {
        self.search_text.as_deref().unwrap_or("")
    }

    /// Decode a request from its JSON wire form
    pub fn decode(payload: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(payload).map_err(|source| crate::Error::Decode {
            what: "query request",
            source,
        })
    }
}

/// A graph query response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub request_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Total number of matches; may exceed `entities.len()`
    pub total_count: usize,
    #[serde(with = "duration_nanos")]
    pub query_time: Duration,
}

impl QueryResponse {
    /// A successful response
    pub fn ok(request_id: impl Into<String>, entities: Vec<Entity>, total_count: usize) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            error: None,
            entities,
            total_count,
            query_time: Duration::ZERO,
        }
    }

    /// A failed response carrying an error message
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            error: Some(message.into()),
            entities: Vec::new(),
            total_count: 0,
            query_time: Duration::ZERO,
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.id.as_str()).collect()
    }
}

/// Durations travel as integer nanoseconds
mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_nanos(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: [QueryKind; 7] = [
        QueryKind::Entity,
        QueryKind::Related,
        QueryKind::DependsOn,
        QueryKind::DependedBy,
        QueryKind::Implements,
        QueryKind::Contains,
        QueryKind::Search,
    ];

    #[test]
    fn test_kind_wire_names() {
        for kind in SUPPORTED {
            assert_eq!(QueryKind::from(kind.as_str()), kind);
        }
        assert_eq!(
            QueryKind::from("walk"),
            QueryKind::Unknown("walk".to_string())
        );
    }

    #[test]
    fn test_unknown_kind_still_decodes() {
        let req = QueryRequest::decode(br#"{"request_id": "r1", "type": "shortest_path"}"#).unwrap();
        assert_eq!(req.kind, QueryKind::Unknown("shortest_path".to_string()));
    }

    #[test]
    fn test_request_wire_format() {
        let req = QueryRequest::decode(
            br#"{"request_id": "r2", "type": "related", "entity_id": "a", "relation": "calls",
                 "max_results": -3, "include_triples": true, "depth": 2}"#,
        )
        .unwrap();

        assert_eq!(req.kind, QueryKind::Related);
        assert_eq!(req.entity_id(), "a");
        assert_eq!(req.relation.as_deref(), Some("calls"));
        assert_eq!(req.max_results, Some(-3));
        assert!(req.include_full_facts);
        assert_eq!(req.depth, Some(2));
    }

    #[test]
    fn test_missing_request_id_fails_decode() {
        assert!(QueryRequest::decode(br#"{"type": "search"}"#).is_err());
    }

    #[test]
    fn test_response_serializes_query_time_as_nanos() {
        let mut resp = QueryResponse::ok("r", Vec::new(), 0);
        resp.query_time = Duration::from_micros(3);

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["query_time"], 3000);
        assert_eq!(value["success"], true);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_response() {
        let resp = QueryResponse::error("r", "entity not found");
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("entity not found"));
        assert!(resp.entities.is_empty());
    }
}
