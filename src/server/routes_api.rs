use crate::search::SearchHit;
use crate::server::openapi::{QueueStatsSchema, SearchHitSchema};
use crate::server::AppContext;
use crate::state::QueueStats;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const SEARCH_LIMIT: usize = 10;

/// Routes reachable without the shared token.
pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/healthz", get(health))
        .route("/search", get(search))
}

/// Liveness plus a snapshot of the job table.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Server version
    pub version: String,
    #[schema(value_type = QueueStatsSchema)]
    pub jobs: QueueStats,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Dispatcher is up", body = HealthResponse)
    )
)]
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: ctx.queue.stats(),
    })
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Search text; empty finds nothing
    #[serde(default)]
    pub q: String,
}

/// Catalog matches for a query.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    #[schema(value_type = Vec<SearchHitSchema>)]
    pub results: Vec<SearchHit>,
    /// The query as received
    pub query: String,
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Up to ten catalog matches", body = SearchResponse)
    )
)]
pub async fn search(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let results = ctx.catalog.search(&params.q, SEARCH_LIMIT);
    Json(SearchResponse {
        results,
        query: params.q,
    })
}
