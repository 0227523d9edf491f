mod harness;

use std::sync::Arc;

use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use harness::config::ConfigBuilder;
use harness::server::TestServer;
use keel_core::{AppError, Environment, ErrorCode, Failure, ValidationIssue};
use keel_server::{ApiResult, Classification, MemorySink, Server, Validate, ValidJson, checked_json};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize, Serialize)]
struct SignUp {
    email: String,
    password: String,
}

impl Validate for SignUp {
    fn validate(&self) -> Vec<ValidationIssue> {
        if self.password.len() > 128 {
            vec![ValidationIssue::new("Password is too long", ["password"])]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Serialize)]
struct Profile {
    id: String,
    email: String,
}

impl Validate for Profile {
    fn validate(&self) -> Vec<ValidationIssue> {
        if self.email.contains('@') {
            Vec::new()
        } else {
            vec![ValidationIssue::new("Invalid email", ["email"])]
        }
    }
}

async fn sign_up(ValidJson(body): ValidJson<SignUp>) -> ApiResult<axum::Json<SignUp>> {
    if body.email == "taken@example.com" {
        return Err(AppError::conflict()
            .with_code(ErrorCode::new("EMAIL_TAKEN").unwrap())
            .with_message("Email already registered")
            .with_detail("field", "email")
            .into());
    }

    Ok(axum::Json(body))
}

async fn profile(Path(id): Path<String>) -> ApiResult<axum::Json<Profile>> {
    checked_json(Profile {
        id,
        email: "not-an-email".to_owned(),
    })
}

#[derive(Debug, Deserialize, Serialize)]
struct Order {
    items: Vec<LineItem>,
    qty: u32,
}

#[derive(Debug, Deserialize, Serialize)]
struct LineItem {
    sku: String,
}

impl Validate for Order {}

async fn place_order(ValidJson(order): ValidJson<Order>) -> axum::Json<Order> {
    axum::Json(order)
}

async fn flaky() -> ApiResult<()> {
    Err(anyhow::anyhow!("connection refused to postgres://admin:secret@db").into())
}

async fn upstream_throttled() -> ApiResult<()> {
    Err(Failure::status(StatusCode::TOO_MANY_REQUESTS, "upstream quota exhausted").into())
}

fn routes() -> Router {
    Router::new()
        .route("/v1/sign-up", post(sign_up))
        .route("/v1/orders", post(place_order))
        .route("/v1/profiles/{id}", get(profile))
        .route("/v1/flaky", get(flaky))
        .route("/v1/upstream", get(upstream_throttled))
}

async fn start(environment: Environment) -> TestServer {
    let config = ConfigBuilder::new().with_environment(environment).build();
    TestServer::start_with(Server::builder(config).routes(routes())).await.unwrap()
}

#[tokio::test]
async fn structured_error_passes_through() {
    let server = start(Environment::Production).await;

    let resp = server
        .client()
        .post(server.url("/v1/sign-up"))
        .json(&json!({ "email": "taken@example.com", "password": "hunter2" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 409);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "code": "EMAIL_TAKEN",
            "message": "Email already registered",
            "details": { "field": "email" },
        })
    );
}

#[tokio::test]
async fn validation_issues_become_bad_request() {
    let server = start(Environment::Production).await;

    let resp = server
        .client()
        .post(server.url("/v1/sign-up"))
        .json(&json!({ "password": "hunter2" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "code": "BAD_REQUEST",
            "message": "Bad request",
            "details": { "issues": [{ "message": "Required", "field": ["email"] }] },
        })
    );
}

#[tokio::test]
async fn response_contract_violation_is_internal() {
    let server = start(Environment::Production).await;

    let (status, _, body) = server.get_json("/v1/profiles/42").await;

    assert_eq!(status, 500);
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["message"], "Response doesn't match the schema");
    assert_eq!(body["details"]["issues"][0]["path"], json!(["email"]));
    assert!(body.get("stack").is_none());
}

#[tokio::test]
async fn collaborator_429_becomes_too_many_requests() {
    let server = start(Environment::Development).await;

    let (status, _, body) = server.get_json("/v1/upstream").await;

    assert_eq!(status, 429);
    assert_eq!(body["code"], "TOO_MANY_REQUESTS");
    assert_eq!(body["message"], "Too many requests");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn unclassified_error_is_redacted_in_production() {
    let server = start(Environment::Production).await;

    let (status, _, body) = server.get_json("/v1/flaky").await;

    assert_eq!(status, 500);
    assert_eq!(body, json!({ "code": "INTERNAL_SERVER_ERROR", "message": "Internal server error" }));
}

#[tokio::test]
async fn unclassified_error_is_disclosed_in_development() {
    let server = start(Environment::Development).await;

    let (status, _, body) = server.get_json("/v1/flaky").await;

    assert_eq!(status, 500);
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(body["details"]["error"]["name"], "anyhow::Error");
    assert!(body["stack"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let server = start(Environment::Production).await;

    let (status, headers, body) = server.get_json("/v1/does-not-exist").await;

    assert_eq!(status, 404);
    assert_eq!(body, json!({ "code": "NOT_FOUND", "message": "Not found" }));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn unsupported_method_is_not_found() {
    let server = start(Environment::Production).await;

    let resp = server.client().delete(server.url("/v1/sign-up")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn nested_issue_path_is_reported_and_recorded() {
    let sink = Arc::new(MemorySink::new());
    let config = ConfigBuilder::new().with_environment(Environment::Development).build();
    let builder = Server::builder(config).routes(routes()).diagnostics(sink.clone());
    let server = TestServer::start_with(builder).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/orders"))
        .json(&json!({ "items": [{ "sku": "A-1" }, {}], "qty": 2 }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body["details"]["issues"],
        json!([{ "message": "Required", "field": ["items", 1, "sku"] }])
    );

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].classification, Classification::Validation);
    assert_eq!(records[0].path, "/v1/orders");
}
