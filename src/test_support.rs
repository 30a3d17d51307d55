use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower::ServiceExt;

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::services::memory_store::MemoryStore;
use crate::services::rendering::{PageImageRenderer, PageRenderer};

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

/// Postgres pool for backend tests, or `None` when `DATABASE_URL` is unset.
///
/// Only databases whose name ends in `_test` are used, since every call
/// truncates all tables. The guard serializes tests sharing the database.
pub(crate) async fn pg_test_pool() -> Option<(PgPool, OwnedMutexGuard<()>)> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();

    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
    let Some(url) = url else {
        eprintln!("skipping postgres test: DATABASE_URL is not set");
        return None;
    };

    let guard = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone().lock_owned().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("connect to test database");
    let current_db: String = sqlx::query_scalar("SELECT current_database()")
        .fetch_one(&pool)
        .await
        .expect("current database");
    if !current_db.ends_with("_test") {
        eprintln!("skipping postgres test: database '{current_db}' is not a *_test database");
        return None;
    }

    crate::db::run_migrations(&pool).await.expect("migrations");
    sqlx::query("TRUNCATE material_regions, materials, score_records, rounds")
        .execute(&pool)
        .await
        .expect("reset tables");

    Some((pool, guard))
}

pub(crate) fn set_test_env() {
    std::env::set_var("ACADEMY_ENV", "test");
    std::env::set_var("ACADEMY_STRICT_CONFIG", "0");
    std::env::set_var("STORAGE_BACKEND", "memory");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("PROJECT_NAME");
    std::env::remove_var("API_V1_STR");
    std::env::remove_var("BACKEND_CORS_ORIGINS");
    std::env::remove_var("PAGE_IMAGES_ROOT");
    std::env::remove_var("SCORE_CONSISTENCY_MODE");
    std::env::remove_var("MAX_REGIONS_PER_MATERIAL");
}

pub(crate) async fn setup_test_context() -> TestContext {
    setup_test_context_with(|| {}).await
}

/// Like [`setup_test_context`], with `configure` run after the defaults are set.
pub(crate) async fn setup_test_context_with(configure: impl FnOnce()) -> TestContext {
    let guard = env_lock().await;
    set_test_env();
    configure();

    let settings = Settings::load().expect("settings");
    let store = Arc::new(MemoryStore::new(settings.storage().max_regions_per_material));
    let renderer = PageImageRenderer::from_settings(&settings)
        .map(|renderer| Arc::new(renderer) as Arc<dyn PageRenderer>);

    let state = AppState::new(settings, store, renderer);
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

/// Registers a material through the API and returns its id.
pub(crate) async fn register_material(
    app: &Router,
    class_name: &str,
    round_number: i32,
    page_count: i32,
) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/materials",
            Some(json!({
                "class_name": class_name,
                "round_number": round_number,
                "title": format!("{class_name} round {round_number}"),
                "page_count": page_count,
                "file_ref": format!("{class_name}/round-{round_number}")
            })),
        ))
        .await
        .expect("register material");

    let status = response.status();
    let body = read_json(response).await;
    assert_eq!(status, axum::http::StatusCode::CREATED, "response: {body}");
    body["id"].as_str().expect("material id").to_string()
}

pub(crate) fn region_json(question_number: u32, page_number: u32) -> serde_json::Value {
    json!({
        "question_number": question_number,
        "page_number": page_number,
        "x": 10.0,
        "y": 20.0 * f64::from(question_number),
        "width": 200.0,
        "height": 18.0
    })
}
