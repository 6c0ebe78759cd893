use anyhow::Result;
use axum::{extract::{Query, State}, routing::get, Json, Router};
use okapi_core::persist::{load_all, IndexPaths};
use okapi_core::tokenizer::{query_terms, tokenize};
use okapi_core::{Bm25Index, DocMeta};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

/// Body of `POST /search`. `query` is kept as raw JSON so that a malformed
/// token list becomes an empty query instead of a rejected request.
#[derive(Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub query: serde_json::Value,
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub terms: Vec<String>,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_index: usize,
    pub external_id: String,
    pub title: Option<String>,
    pub score: f64,
}

/// Shared read-only state. The index is never mutated after load, so handlers
/// read it concurrently without locks.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<Bm25Index>,
    pub docs: Arc<Vec<DocMeta>>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let (index, docs, meta) = load_all(&IndexPaths::new(&index_dir))?;
    tracing::info!(index_dir, num_docs = meta.num_docs, num_terms = meta.num_terms, "loaded index");
    Ok(router(AppState { index: Arc::new(index), docs: Arc::new(docs) }))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
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
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(token_search_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    Json(run_search(&state, tokenize(&params.q), params.k))
}

pub async fn token_search_handler(State(state): State<AppState>, Json(body): Json<TokenQuery>) -> Json<SearchResponse> {
    Json(run_search(&state, query_terms(&body.query), body.k))
}

fn run_search(state: &AppState, terms: Vec<String>, k: usize) -> SearchResponse {
    let start = std::time::Instant::now();
    let k = k.clamp(1, MAX_K);
    // Full ranking first: documents no query term touches score exactly zero
    // and are not reported as hits.
    let ranked = state.index.topk(&terms, None);
    let hits: Vec<(usize, f64)> = ranked.into_iter().filter(|&(_, s)| s != 0.0).collect();
    let total_hits = hits.len();

    let results = hits
        .into_iter()
        .take(k)
        .map(|(doc_index, score)| {
            let meta = state.docs.get(doc_index);
            SearchHit {
                doc_index,
                external_id: meta.map(|m| m.external_id.clone()).unwrap_or_default(),
                title: meta.and_then(|m| m.title.clone()),
                score,
            }
        })
        .collect();

    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(num_terms = terms.len(), total_hits, took_s, "search");
    SearchResponse { terms, took_s, total_hits, results }
}
