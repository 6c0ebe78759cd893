use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use okapi_core::persist::{save_all, IndexPaths};
use okapi_core::tokenizer::tokenize;
use okapi_core::{Bm25Index, DocMeta};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path) {
    let texts = [
        ("doc0", "Rust is great. Rust systems programming."),
        ("doc1", "Learning rust takes patience and practice."),
        ("doc2", "Gardening in spring."),
        ("doc3", "Baking bread at home."),
        ("doc4", "Knitting a warm scarf."),
        ("doc5", "Cycling to work daily."),
    ];
    let corpus: Vec<Vec<String>> = texts.iter().map(|(_, t)| tokenize(t)).collect();
    let docs: Vec<DocMeta> = texts
        .iter()
        .map(|(id, _)| DocMeta { external_id: id.to_string(), title: Some(id.to_uppercase()) })
        .collect();
    let index = Bm25Index::build(&corpus).unwrap();
    save_all(&IndexPaths::new(dir), &index, &docs).unwrap();
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn app() -> (tempfile::TempDir, Router) {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_string_lossy().to_string()).unwrap();
    (dir, app)
}

fn post(body: Value) -> Request<Body> {
    Request::post("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (_dir, app) = app();
    let (status, json) = send(app, Request::get("/search?q=Rust!&k=5").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["terms"], json!(["rust"]));
    assert_eq!(json["total_hits"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_index"], 0);
    assert_eq!(arr[0]["external_id"], "doc0");
    assert_eq!(arr[0]["title"], "DOC0");
    assert_eq!(arr[1]["doc_index"], 1);
    assert!(arr[0]["score"].as_f64().unwrap() > arr[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn k_limits_results_but_not_total_hits() {
    let (_dir, app) = app();
    let (_, json) = send(app, Request::get("/search?q=rust&k=1").body(Body::empty()).unwrap()).await;
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn token_query_via_post() {
    let (_dir, app) = app();
    let (status, json) = send(app, post(json!({"query": ["gardening", "unknown"], "k": 3}))).await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["external_id"], "doc2");
}

#[tokio::test]
async fn malformed_token_query_has_no_hits() {
    let (_dir, app) = app();
    let (status, json) = send(app.clone(), post(json!({"query": ["rust", 5]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
    let (_, json) = send(app, post(json!({"query": "rust"}))).await;
    assert_eq!(json["total_hits"], 0);
}

#[tokio::test]
async fn health_check() {
    let (_dir, app) = app();
    let resp = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn missing_index_fails_to_load() {
    let dir = tempdir().unwrap();
    assert!(server::build_app(dir.path().join("absent").to_string_lossy().to_string()).is_err());
}
