//! Mock HTTP tests for the relay forwarder.
//!
//! These tests cover:
//! - JPEG snapshots arriving at the endpoint with the right content type
//! - Sampling cadence (only every Nth frame is pushed)
//! - Failure swallowing: a dead or erroring endpoint never surfaces

use std::time::{Duration, Instant};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edgeviewer::frame::PackedBuffer;
use edgeviewer::relay::RelayForwarder;

fn gradient(width: u32, height: u32) -> PackedBuffer {
    let mut buf = PackedBuffer::try_new(width, height).unwrap();
    for (i, px) in buf.as_mut_slice().chunks_exact_mut(4).enumerate() {
        let v = (i % 256) as u8;
        px.copy_from_slice(&[v, 255 - v, v / 2, 255]);
    }
    buf
}

async fn wait_for_requests(server: &MockServer, count: usize, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;
    loop {
        let received = server.received_requests().await.unwrap_or_default().len();
        if received >= count || Instant::now() >= deadline {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_snapshot_posted_as_jpeg() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut relay =
        RelayForwarder::with_cadence(format!("{}/ingest", server.uri()), 2, 60).unwrap();
    let frame = gradient(32, 32);
    relay.offer(&frame);
    relay.offer(&frame);

    let received = wait_for_requests(&server, 1, Duration::from_secs(5)).await;
    assert!(received >= 1, "expected at least one snapshot push");

    let requests = server.received_requests().await.unwrap();
    // SOI marker at the start of the JPEG body
    assert_eq!(&requests[0].body[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_cadence_limits_pushes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut relay =
        RelayForwarder::with_cadence(format!("{}/ingest", server.uri()), 10, 60).unwrap();
    let frame = gradient(16, 16);
    for _ in 0..9 {
        relay.offer(&frame);
    }

    // Below the cadence: nothing should arrive
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 0);

    // The 10th offer crosses it
    relay.offer(&frame);
    let received = wait_for_requests(&server, 1, Duration::from_secs(5)).await;
    assert_eq!(received, 1);
}

#[tokio::test]
async fn test_server_errors_are_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut relay =
        RelayForwarder::with_cadence(format!("{}/ingest", server.uri()), 1, 60).unwrap();
    let frame = gradient(16, 16);
    for _ in 0..5 {
        relay.offer(&frame);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Every push failed server-side; offering kept working regardless
    assert_eq!(relay.offered(), 5);
    let received = wait_for_requests(&server, 1, Duration::from_secs(5)).await;
    assert!(received >= 1);
}

#[tokio::test]
async fn test_dead_endpoint_never_surfaces() {
    // Nothing listens on this port; connection failures stay internal
    let mut relay =
        RelayForwarder::with_cadence("http://127.0.0.1:1/ingest".to_string(), 1, 60).unwrap();
    let frame = gradient(16, 16);
    for _ in 0..3 {
        relay.offer(&frame);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(relay.offered(), 3);
}
