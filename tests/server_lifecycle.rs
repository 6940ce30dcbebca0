//! Serving over real TCP, concurrent legacy traffic and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use route_registry::lifecycle::{spawn_flusher, Shutdown};

mod common;

#[tokio::test]
async fn test_concurrent_legacy_traffic_is_counted_exactly() {
    let app = common::build_app(common::config());
    let shutdown = Shutdown::new();
    let (addr, server) = common::start_server(&app, &shutdown).await;

    let concurrency = 10;
    let requests_per_task = 20;
    let client = reqwest::Client::new();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{}/old/v1/events?page=2", addr);
        tasks.push(tokio::spawn(async move {
            let mut ok: u64 = 0;
            for _ in 0..requests_per_task {
                let resp = client.get(&url).send().await.unwrap();
                if resp.status().is_success() && resp.headers().contains_key("x-deprecated") {
                    ok += 1;
                }
            }
            ok
        }));
    }

    let mut succeeded: u64 = 0;
    for task in tasks {
        succeeded += task.await.unwrap();
    }

    let total = (concurrency * requests_per_task) as u64;
    assert_eq!(succeeded, total);
    assert_eq!(app.telemetry().pending()["old/v1/events"].call_count, total);
    assert_eq!(app.dispatcher().unwrap().redirect_count(), total);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_discovery_over_http() {
    let app = common::build_app(common::config());
    let shutdown = Shutdown::new();
    let (addr, server) = common::start_server(&app, &shutdown).await;

    let resp = reqwest::get(format!("http://{}/app/v1/discover", addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["api"]["namespace"], "app/v1");
    assert!(body["routes"]["app/v1/events"].is_object());
    assert_eq!(body["routes"]["old/v1/events"]["group"], "legacy");

    shutdown.trigger();
    server.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_flushes_pending_counts_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deprecations.json");
    let mut config = common::config();
    config.telemetry.store_path = Some(path.display().to_string());
    config.telemetry.flush_interval_secs = 3600;

    let app = common::build_app(config);
    let shutdown = Shutdown::new();
    let flusher = spawn_flusher(
        Arc::clone(app.telemetry()),
        Duration::from_secs(3600),
        shutdown.subscribe(),
    );
    let (addr, server) = common::start_server(&app, &shutdown).await;

    let client = reqwest::Client::new();
    for id in 1..=3 {
        let resp = client
            .get(format!("http://{}/old/v1/events/{}", addr, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert!(!path.exists());

    shutdown.trigger();
    server.await.unwrap();
    flusher.await.unwrap();

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let aggregate = &stored["deprecated_route_stats"]["old/v1/events/{id}"];
    assert_eq!(aggregate["total_count"], 3);
    assert_eq!(aggregate["canonical_route"], "app/v1/events/{id}");
    assert!(app.telemetry().pending().is_empty());
}
