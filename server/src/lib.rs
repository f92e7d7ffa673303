use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use sparsedex_core::{Document, IndexService, QueryResult, ServiceConfig, SharedService};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiResult<T> = std::result::Result<Json<T>, (StatusCode, String)>;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub queries: Vec<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub took_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub results: Vec<QueryResult>,
}

#[derive(Deserialize)]
pub struct IndexRequest {
    pub docs: Vec<Document>,
}

#[derive(Clone)]
pub struct AppState {
    pub service: SharedService,
    /// Required in `X-ADMIN-TOKEN` for mutating endpoints when set.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(service: IndexService, admin_token: Option<String>) -> Self {
        Self { service: service.into_shared(), admin_token }
    }

    /// Open (or create) the workspace at `workspace`.
    pub fn open(workspace: &str, config: ServiceConfig, admin_token: Option<String>) -> Result<Self> {
        Ok(Self::new(IndexService::open(workspace, config)?, admin_token))
    }
}

fn cors_layer() -> CorsLayer {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_get).post(search_post))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index", post(index_handler))
        .route("/cache_idfs", post(cache_idfs_handler))
        .route("/dump", post(dump_handler))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn internal(err: anyhow::Error) -> (StatusCode, String) {
    tracing::error!(error = %format!("{err:#}"), "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
}

fn run_search(state: &AppState, queries: &[String], top_k: Option<usize>) -> ApiResult<SearchResponse> {
    let start = std::time::Instant::now();
    let service = state.service.read();
    let results = service.search_texts(queries, top_k).map_err(internal)?;
    let warning = service.status().map(|w| w.to_string());
    Ok(Json(SearchResponse { took_s: start.elapsed().as_secs_f64(), warning, results }))
}

pub async fn search_get(State(state): State<AppState>, Query(params): Query<SearchParams>) -> ApiResult<SearchResponse> {
    run_search(&state, &[params.q], params.k)
}

pub async fn search_post(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> ApiResult<SearchResponse> {
    if req.queries.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no queries given".into()));
    }
    run_search(&state, &req.queries, req.top_k)
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> ApiResult<Document> {
    match state.service.read().document(&doc_id).map_err(internal)? {
        Some(doc) => Ok(Json(doc)),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap, Json(req): Json<IndexRequest>) -> ApiResult<serde_json::Value> {
    authorize(&state, &headers)?;
    if req.docs.iter().any(|d| d.id.is_empty()) {
        return Err((StatusCode::BAD_REQUEST, "document id must not be empty".into()));
    }
    let indexed = state.service.write().index_documents(&req.docs).map_err(internal)?;
    Ok(Json(serde_json::json!({ "indexed": indexed })))
}

async fn cache_idfs_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<serde_json::Value> {
    authorize(&state, &headers)?;
    let terms = state.service.write().refresh_idf_cache();
    Ok(Json(serde_json::json!({ "terms": terms })))
}

async fn dump_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<serde_json::Value> {
    authorize(&state, &headers)?;
    let meta = state.service.write().persist().map_err(internal)?;
    Ok(Json(serde_json::json!({ "num_docs": meta.num_docs, "created_at": meta.created_at })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Ok(()),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
