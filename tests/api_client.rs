mod common;

use std::time::Duration;

use common::{png_file, FakeServer, Reply};
use visionguard::{ApiClient, ApiConfig};

fn client_for(server: &FakeServer, timeout: Duration) -> ApiClient {
    ApiClient::new(ApiConfig {
        base_url: server.base_url.clone(),
        timeout,
    })
}

#[test]
fn posts_multipart_file_and_parses_detections() {
    let server = FakeServer::start(vec![Reply::json(
        200,
        r#"{"detections":[{"class_name":"cat","confidence":0.873,"bbox":[10,20,110,220]}],"annotated_image":"QUJD"}"#,
    )]);
    let client = client_for(&server, Duration::from_secs(5));

    let response = client.detect_image(&png_file("cat.png")).expect("detect");
    assert_eq!(response.detections.len(), 1);
    assert_eq!(response.detections[0].class_name, "cat");
    assert_eq!(response.detections[0].bbox, [10.0, 20.0, 110.0, 220.0]);
    assert_eq!(response.annotated_image.as_deref(), Some("QUJD"));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/detect/image");
    let content_type = request.headers.get("content-type").expect("content type");
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = request.body_text();
    assert!(body.contains("Content-Disposition: form-data; name=\"file\"; filename=\"cat.png\""));
    assert!(body.contains("Content-Type: image/png"));
    assert!(request
        .body
        .windows(common::PNG_BYTES.len())
        .any(|w| w == common::PNG_BYTES));
}

#[test]
fn health_check_reads_message_and_status() {
    let server = FakeServer::start(vec![Reply::json(
        200,
        r#"{"message":"VisionGuard API is running","status":"healthy"}"#,
    )]);
    let client = client_for(&server, Duration::from_secs(5));

    let health = client.check_health().expect("health");
    assert_eq!(health.status, "healthy");
    assert_eq!(health.message, "VisionGuard API is running");
    assert_eq!(server.requests()[0].method, "GET");
    assert_eq!(server.requests()[0].path, "/");
}

#[test]
fn server_error_detail_is_reported() {
    let server = FakeServer::start(vec![Reply::json(
        500,
        r#"{"detail":"Detection failed: model not loaded"}"#,
    )]);
    let client = client_for(&server, Duration::from_secs(5));

    let err = client.detect_image(&png_file("cat.png")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Request failed with status code 500: Detection failed: model not loaded"
    );
}

#[test]
fn status_without_detail_still_fails() {
    let server = FakeServer::start(vec![Reply::json(404, "not json")]);
    let client = client_for(&server, Duration::from_secs(5));

    let err = client.detect_image(&png_file("cat.png")).unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status code 404");
}

#[test]
fn malformed_body_is_an_error() {
    let server = FakeServer::start(vec![Reply::json(200, r#"{"boxes":[]}"#)]);
    let client = client_for(&server, Duration::from_secs(5));

    let err = client.detect_image(&png_file("cat.png")).unwrap_err();
    assert!(err.to_string().contains("invalid response"));
}

#[test]
fn slow_server_times_out() {
    let server = FakeServer::start(vec![
        Reply::json(200, r#"{"detections":[]}"#).delayed(Duration::from_secs(3))
    ]);
    let client = client_for(&server, Duration::from_millis(300));

    let err = client.detect_image(&png_file("cat.png")).unwrap_err();
    assert!(
        err.to_string().contains("timeout of 300ms exceeded"),
        "unexpected error: {err}"
    );
}

#[test]
fn unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ApiConfig {
        base_url: format!("http://{}", addr),
        timeout: Duration::from_secs(2),
    });
    let err = client.detect_image(&png_file("cat.png")).unwrap_err();
    assert!(err.to_string().starts_with("Network Error"), "unexpected error: {err}");
}
