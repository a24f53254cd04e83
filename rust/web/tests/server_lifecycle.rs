use athena_web::server::{ServerConfig, WebServer};
use athena_web::store::{MemoryStore, Store};
use athena_web::reset_and_seed;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use warp::hyper::{self, Client as HyperClient};

#[tokio::test]
async fn seeded_server_serves_api_and_client() {
    let static_dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(static_dir.path().join("index.html"), "<html>athena</html>")
        .expect("write index");

    let store = Arc::new(MemoryStore::new());
    let (ruleset, session) = reset_and_seed(store.as_ref(), chrono::Utc::now())
        .await
        .expect("seed");

    let config = ServerConfig::new("127.0.0.1", 0, static_dir.path());
    let handle = WebServer::new(config, store.clone() as Arc<dyn Store>)
        .start()
        .await
        .expect("start server");
    let address = handle.address();
    let client = HyperClient::new();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let uri: hyper::Uri = format!("http://{address}/api/session")
        .parse()
        .expect("parse session uri");
    let response = client.get(uri).await.expect("list sessions");
    assert_eq!(response.status(), hyper::StatusCode::OK);
    assert_eq!(
        response.headers()[hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let body = hyper::body::to_bytes(response.into_body())
        .await
        .expect("read body");
    let sessions: Value = serde_json::from_slice(&body).expect("parse sessions");
    assert_eq!(sessions[0]["id"], session.id.to_hex().as_str());
    assert_eq!(sessions[0]["ruleset"], ruleset.id.to_hex().as_str());
    assert_eq!(sessions[0]["durationActive"], 120);
    assert_eq!(sessions[0]["players"].as_array().map(Vec::len), Some(3));

    let uri: hyper::Uri = format!("http://{address}/app")
        .parse()
        .expect("parse app uri");
    let response = client.get(uri).await.expect("fetch client");
    assert_eq!(response.status(), hyper::StatusCode::OK);
    let body = hyper::body::to_bytes(response.into_body())
        .await
        .expect("read index");
    assert_eq!(&body[..], b"<html>athena</html>");

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn occupied_port_is_a_bind_error() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let first = WebServer::new(ServerConfig::for_tests(), Arc::clone(&store))
        .start()
        .await
        .expect("first server");
    let taken = first.address();

    let config = ServerConfig::new(taken.ip().to_string(), taken.port(), "dist");
    let err = WebServer::new(config, store)
        .start()
        .await
        .expect_err("port in use");

    assert!(matches!(err, athena_web::ServerError::BindError(_)));
    first.shutdown().await.expect("shutdown");
}
