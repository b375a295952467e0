//! Integration tests for the HTTP surface: health probes and GraphQL over POST

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use library_backend::config::Config;
use library_backend::graphql::build_schema;
use library_backend::services::{AuthService, LibraryEvents, ServicesManager};
use library_backend::store::{MemoryStore, SharedStore, seed_sample_data};
use library_backend::{AppState, build_app};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STORE_BACKEND", "memory"),
        ("JWT_SECRET", "router-test-secret"),
        ("AUTH_MODE", "strict"),
    ]);
    let config = Config::from_source(|key| vars.get(key).map(|v| v.to_string())).unwrap();

    let memory = Arc::new(MemoryStore::new());
    seed_sample_data(memory.as_ref()).await.unwrap();
    let store: SharedStore = memory;
    let auth = Arc::new(AuthService::new(store.clone(), config.auth_config()));
    let schema = build_schema(store.clone(), auth.clone(), LibraryEvents::default());

    build_app(AppState {
        config: Arc::new(config),
        schema,
        store,
        auth,
        services: Arc::new(ServicesManager::new()),
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn graphql_post(query: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/graphql").header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn healthz_reports_healthy() {
    let response = app()
        .await
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn readyz_checks_the_store() {
    let response = app()
        .await
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn graphql_post_executes_queries() {
    let response = app()
        .await
        .oneshot(graphql_post("{ bookCount authorCount }", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "data": { "bookCount": 7, "authorCount": 5 } })
    );
}

#[tokio::test]
async fn graphql_post_rejects_bad_token_in_strict_mode() {
    let response = app()
        .await
        .oneshot(graphql_post("{ me { username } }", Some("Bearer not.a.token")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn graphql_get_serves_graphiql_to_browsers_only() {
    let browser = app()
        .await
        .oneshot(
            Request::get("/graphql")
                .header(header::ACCEPT, "text/html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(browser.status(), StatusCode::OK);

    let api_client = app()
        .await
        .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(api_client.status(), StatusCode::METHOD_NOT_ALLOWED);
}
