mod harness;

use harness::config::ConfigBuilder;
use harness::server::TestServer;
use keel_core::Environment;
use keel_health::{FnProbe, ServiceStatus, StaticProbe};
use keel_server::Server;
use serde_json::json;

#[tokio::test]
async fn empty_registry_is_ok() {
    let server = TestServer::start(ConfigBuilder::new().build()).await.unwrap();

    let (status, _, body) = server.get_json("/v1/health").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "keel-test");
    assert_eq!(body["version"], "9.9.9");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["timezone"], "UTC");
    assert_eq!(body["services"], json!({}));
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn one_failing_dependency_degrades() {
    let builder = Server::builder(ConfigBuilder::new().build())
        .probe("db", StaticProbe(ServiceStatus::Ok))
        .unwrap()
        .probe("cache", StaticProbe(ServiceStatus::Ok))
        .unwrap()
        .probe("queue", StaticProbe(ServiceStatus::Error))
        .unwrap();
    let server = TestServer::start_with(builder).await.unwrap();

    let (status, _, body) = server.get_json("/v1/health").await;

    assert_eq!(status, 503);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"], json!({ "cache": "ok", "db": "ok", "queue": "error" }));
}

#[tokio::test]
async fn configured_tcp_probes() {
    let database = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

    // Reserve a port, then free it so nothing answers there
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed_addr = closed.local_addr().unwrap();
    drop(closed);

    let config = ConfigBuilder::new()
        .with_tcp_probe("db", database.local_addr().unwrap())
        .with_tcp_probe("broker", closed_addr)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let (status, _, body) = server.get_json("/v1/health").await;

    assert_eq!(status, 503);
    assert_eq!(body["services"], json!({ "broker": "error", "db": "ok" }));
}

#[tokio::test]
async fn failing_probe_does_not_hide_others() {
    let builder = Server::builder(ConfigBuilder::new().build())
        .probe("db", FnProbe::new(|| async { Err(anyhow::anyhow!("no rows returned")) }))
        .unwrap()
        .probe("cache", StaticProbe(ServiceStatus::Ok))
        .unwrap();
    let server = TestServer::start_with(builder).await.unwrap();

    let (status, _, body) = server.get_json("/v1/health").await;

    assert_eq!(status, 503);
    assert_eq!(body["services"], json!({ "cache": "ok", "db": "error" }));
}

#[tokio::test]
async fn hung_probe_times_out() {
    let builder = Server::builder(ConfigBuilder::new().with_probe_timeout("100ms").build())
        .probe(
            "stuck",
            FnProbe::new(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                Ok(ServiceStatus::Ok)
            }),
        )
        .unwrap();
    let server = TestServer::start_with(builder).await.unwrap();

    let started = std::time::Instant::now();
    let (status, _, body) = server.get_json("/v1/health").await;

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(status, 503);
    assert_eq!(body["services"]["stuck"], "error");
}

#[tokio::test]
async fn custom_path_and_environment() {
    let config = ConfigBuilder::new()
        .with_health_path("/healthz")
        .with_environment(Environment::Production)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let (status, _, body) = server.get_json("/healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body["environment"], "production");

    let (status, _, _) = server.get_json("/v1/health").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn health_endpoint_disabled() {
    let server = TestServer::start(ConfigBuilder::new().without_health().build()).await.unwrap();

    let (status, _, body) = server.get_json("/v1/health").await;

    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}
