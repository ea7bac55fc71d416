//! `GET /` over HTTP

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use common::{client, free_port, start_server, url, FailingInfo, RecordingExecutor};
use hostctl_agent::capture::SyntheticDisplaySource;
use hostctl_agent::config::CapturePolicy;
use hostctl_agent::control::{ControlServer, HandlerContext, DASHBOARD_PATH};
use reqwest::StatusCode;
use std::sync::Arc;

const IMG_PREFIX: &str = "<img src=\"data:image/png;base64,";

#[tokio::test]
async fn test_dashboard_inlines_every_display() {
    let (server, _) = start_server(3).await;

    let response = client().get(url(&server, DASHBOARD_PATH)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let page = response.text().await.unwrap();
    assert!(page.contains("Host: test-host"));
    assert!(page.contains("Memory: 4.0GB/16GB"));
    assert_eq!(page.matches(IMG_PREFIX).count(), 3);

    for chunk in page.split(IMG_PREFIX).skip(1) {
        let encoded = &chunk[..chunk.find('"').unwrap()];
        let png = STANDARD.decode(encoded).expect("Invalid base64");
        let image = image::load_from_memory(&png).expect("Invalid PNG");
        assert_eq!((image.width(), image.height()), (8, 6));
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_dashboard_degrades_on_failures() {
    let context = HandlerContext {
        executor: Arc::new(RecordingExecutor::default()),
        displays: Arc::new(SyntheticDisplaySource::with_displays(2, 4, 4).failing_on(1)),
        info: Arc::new(FailingInfo),
        capture_policy: CapturePolicy::Abort,
        max_body_bytes: 1024,
    };
    let server = ControlServer::new(free_port(), context);
    server.start().await.unwrap();

    let response = client().get(url(&server, DASHBOARD_PATH)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = response.text().await.unwrap();
    assert!(page.contains("Host information unavailable: sysinfo unavailable"));
    assert!(page.contains("Screenshots unavailable"));
    assert!(!page.contains(IMG_PREFIX));

    // Still serving after a degraded render
    assert!(server.health_check().await);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_dashboard_skip_policy_keeps_good_displays() {
    let context = HandlerContext {
        executor: Arc::new(RecordingExecutor::default()),
        displays: Arc::new(SyntheticDisplaySource::with_displays(3, 4, 4).failing_on(1)),
        info: Arc::new(common::FixedInfo),
        capture_policy: CapturePolicy::Skip,
        max_body_bytes: 1024,
    };
    let server = ControlServer::new(free_port(), context);
    server.start().await.unwrap();

    let page = client()
        .get(url(&server, DASHBOARD_PATH))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(page.matches(IMG_PREFIX).count(), 2);

    server.stop().await.unwrap();
}
