use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use crate::entity::Entity;
use crate::index::ScalarField;
use crate::ingest::Applied;
use crate::query::{QueryRequest, QueryResponse};
use crate::server::AppState;
use crate::service::ServiceStats;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct EntityParams {
    pub facts: Option<bool>,
}

#[derive(Deserialize)]
pub struct LookupParams {
    pub field: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub id: String,
    pub replaced: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (status, Json(ErrorResponse { error: error.to_string() }))
}

/// Apply one entity update. Malformed bodies are rejected with 400.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let id = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
        .unwrap_or_default();

    let applied = state
        .service
        .ingest_raw(&body)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    Ok(Json(IngestResponse {
        id,
        replaced: applied == Applied::Replaced,
    }))
}

/// Run one query. Query-level failures stay inside the envelope.
pub async fn query(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError> {
    let req = QueryRequest::decode(&body).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    Ok(Json(state.service.query(&req)))
}

pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<EntityParams>,
) -> Result<Json<Entity>, ApiError> {
    state
        .service
        .entity(&id, params.facts.unwrap_or(false))
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "entity not found"))
}

pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let field: ScalarField = params
        .field
        .parse()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    Ok(Json(state.service.lookup(field, &params.value)))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ServiceStats> {
    Json(state.service.stats())
}
