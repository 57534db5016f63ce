//! API integration tests for image processing, uploads and error handling.
//!
//! Tests verify:
//! - Process requests store the image and return a reference with effect hints
//! - Validation failures name every bad field and write nothing
//! - Upload size and type limits
//! - Stored files are served back byte-identical
//! - Remote fetch timeouts and failures
//! - Uniform error bodies for storage failures and unknown routes

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use blurcraft::fetch::ImageFetcher;
use blurcraft::{create_router, ImageService, MockGallery, RouterConfig};

use super::test_utils::{
    body_bytes, body_json, empty_request, multipart_request, path_of, process_body,
    spawn_image_host, FailingStore, TestApp, PNG_BYTES,
};

// =============================================================================
// Process
// =============================================================================

#[tokio::test]
async fn test_process_returns_reference_with_hints() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/api/images/process", &process_body(PNG_BYTES, "HELLO", 15))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    let url = json["processedImageUrl"].as_str().unwrap();
    assert!(url.starts_with("/uploads/processed-"), "got {}", url);
    assert!(url.contains(".png?"));
    assert!(url.ends_with("?blur=15&text=HELLO"));

    // Exactly one file written, bytes unchanged
    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("processed-"));
    let stored = std::fs::read(app.dir.path().join(&files[0])).unwrap();
    assert_eq!(stored, PNG_BYTES);
}

#[tokio::test]
async fn test_process_encodes_overlay_text() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/images/process",
            &process_body(PNG_BYTES, "Hello World & more", 0),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let url = json["processedImageUrl"].as_str().unwrap();
    assert!(url.ends_with("?blur=0&text=Hello%20World%20%26%20more"), "got {}", url);
}

#[tokio::test]
async fn test_process_absolute_url_with_host() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images/process")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::HOST, "localhost:3001")
        .body(Body::from(process_body(PNG_BYTES, "HELLO", 15).to_string()))
        .unwrap();

    let json = body_json(app.send(request).await).await;
    let url = json["processedImageUrl"].as_str().unwrap();
    assert!(
        url.starts_with("http://localhost:3001/uploads/processed-"),
        "got {}",
        url
    );
}

#[tokio::test]
async fn test_process_public_base_url_wins() {
    let app = TestApp::with_config(
        RouterConfig::without_auth().with_public_base_url("https://cdn.example.com/"),
    )
    .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images/process")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::HOST, "localhost:3001")
        .body(Body::from(process_body(PNG_BYTES, "HELLO", 15).to_string()))
        .unwrap();

    let json = body_json(app.send(request).await).await;
    let url = json["processedImageUrl"].as_str().unwrap();
    assert!(url.starts_with("https://cdn.example.com/uploads/"), "got {}", url);
}

#[tokio::test]
async fn test_process_rejects_named_color() {
    let app = TestApp::new().await;

    let mut body = process_body(PNG_BYTES, "HELLO", 15);
    body["textOverlay"]["color"] = json!("red");

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("textOverlay.color"));

    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "textOverlay.color");

    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_process_reports_every_invalid_field() {
    let app = TestApp::new().await;

    let body = json!({
        "imageData": "data:image/png;base64,iVBORw0KGgo=",
        "textOverlay": {
            "text": "",
            "fontSize": 5,
            "color": "white",
            "position": { "x": 150, "y": -1 },
            "rotation": 270
        },
        "blurIntensity": 51
    });

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let fields: HashSet<String> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap().to_string())
        .collect();

    for expected in [
        "textOverlay.text",
        "textOverlay.fontSize",
        "textOverlay.color",
        "textOverlay.position.x",
        "textOverlay.position.y",
        "textOverlay.rotation",
        "blurIntensity",
    ] {
        assert!(fields.contains(expected), "missing {}", expected);
    }

    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_process_blur_boundaries() {
    let app = TestApp::new().await;

    for blur in [0, 50] {
        let response = app
            .post_json("/api/images/process", &process_body(PNG_BYTES, "edge", blur))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "blur {}", blur);
    }

    for blur in [-1, 51] {
        let response = app
            .post_json("/api/images/process", &process_body(PNG_BYTES, "edge", blur))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "blur {}", blur);
    }

    assert_eq!(app.stored_files().len(), 2);
}

#[tokio::test]
async fn test_process_requires_input() {
    let app = TestApp::new().await;

    let mut body = process_body(PNG_BYTES, "HELLO", 15);
    body.as_object_mut().unwrap().remove("imageData");

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Image URL or image data is required");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_process_invalid_base64() {
    let app = TestApp::new().await;

    let mut body = process_body(PNG_BYTES, "HELLO", 15);
    body["imageData"] = json!("data:image/png;base64,@@not base64@@");

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid image data"));
}

#[tokio::test]
async fn test_process_accepts_unpadded_base64() {
    let app = TestApp::new().await;

    let mut body = process_body(PNG_BYTES, "HELLO", 15);
    body["imageData"] = json!("data:image/png;base64,iVBORw0KGgo");

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    let stored = std::fs::read(app.dir.path().join(&files[0])).unwrap();
    assert_eq!(stored, b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_process_svg_is_not_served_as_markup() {
    let app = TestApp::new().await;

    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
    let mut body = process_body(PNG_BYTES, "HELLO", 15);
    body["imageData"] = json!(blurcraft::DataUri::encode("image/svg+xml", svg));

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let path = path_of(json["processedImageUrl"].as_str().unwrap());
    let file = path.split('?').next().unwrap();
    assert!(file.ends_with(".png"), "got {}", path);

    let response = app.get(&path).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(!content_type.contains("svg"), "got {}", content_type);
}

#[tokio::test]
async fn test_process_malformed_json() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_concurrent_process_calls_get_distinct_files() {
    let app = TestApp::new().await;

    let requests = (0..8).map(|i| {
        let router = app.router.clone();
        let body = process_body(PNG_BYTES, &format!("image {}", i), 10);
        async move {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/images/process")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            router.oneshot(request).await.unwrap()
        }
    });

    let mut urls = HashSet::new();
    for response in futures_join_all(requests).await {
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        urls.insert(json["processedImageUrl"].as_str().unwrap().to_string());
    }

    assert_eq!(urls.len(), 8);
    assert_eq!(app.stored_files().len(), 8);
}

/// Run futures concurrently on the runtime and collect results in order.
async fn futures_join_all<F>(futures: impl Iterator<Item = F>) -> Vec<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

// =============================================================================
// Remote Fetch
// =============================================================================

#[tokio::test]
async fn test_process_fetches_remote_image() {
    let host = spawn_image_host().await;
    let app = TestApp::new().await;

    let mut body = process_body(PNG_BYTES, "REMOTE", 20);
    body.as_object_mut().unwrap().remove("imageData");
    body["imageUrl"] = json!(format!("http://{}/image.png", host));

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".png"));
    let stored = std::fs::read(app.dir.path().join(&files[0])).unwrap();
    assert_eq!(stored, PNG_BYTES);
}

#[tokio::test]
async fn test_process_remote_timeout() {
    let host = spawn_image_host().await;
    let app = TestApp::build(RouterConfig::without_auth(), |service| {
        service.with_fetcher(ImageFetcher::new(Duration::from_millis(200)))
    })
    .await;

    let mut body = process_body(PNG_BYTES, "SLOW", 20);
    body.as_object_mut().unwrap().remove("imageData");
    body["imageUrl"] = json!(format!("http://{}/slow.png", host));

    let started = std::time::Instant::now();
    let response = app.post_json("/api/images/process", &body).await;
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to fetch image from URL"), "got {}", error);
    assert!(error.contains("timeout"), "got {}", error);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_process_remote_not_found() {
    let host = spawn_image_host().await;
    let app = TestApp::new().await;

    let mut body = process_body(PNG_BYTES, "MISSING", 20);
    body.as_object_mut().unwrap().remove("imageData");
    body["imageUrl"] = json!(format!("http://{}/missing.png", host));

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("404"));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_process_remote_over_limit() {
    let host = spawn_image_host().await;
    let app = TestApp::build(RouterConfig::without_auth(), |service| {
        service.with_max_upload_bytes(1024)
    })
    .await;

    let mut body = process_body(PNG_BYTES, "LARGE", 20);
    body.as_object_mut().unwrap().remove("imageData");
    body["imageUrl"] = json!(format!("http://{}/large.png", host));

    let response = app.post_json("/api/images/process", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("exceeds"), "got {}", error);
    assert!(app.stored_files().is_empty());
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .send(multipart_request(
            "/api/images/upload",
            "image",
            "photo.png",
            "image/png",
            PNG_BYTES,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let file_url = json["fileUrl"].as_str().unwrap();
    let file_id = json["fileId"].as_str().unwrap();
    assert!(file_id.starts_with("original-"));
    assert!(file_url.ends_with(&format!("{}.png", file_id)));

    // Served back unchanged from the static prefix
    let served = app.get(&path_of(file_url)).await;
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(body_bytes(served).await.as_ref(), PNG_BYTES);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = TestApp::new().await;
    let data = vec![0u8; 12 * 1024 * 1024];

    let response = app
        .send(multipart_request(
            "/api/images/upload",
            "image",
            "huge.png",
            "image/png",
            &data,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("10MB"));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_exactly_at_limit() {
    let app = TestApp::build(RouterConfig::without_auth(), |service| {
        service.with_max_upload_bytes(1024)
    })
    .await;

    let ok = app
        .send(multipart_request(
            "/api/images/upload",
            "image",
            "a.png",
            "image/png",
            &[7u8; 1024],
        ))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let over = app
        .send(multipart_request(
            "/api/images/upload",
            "image",
            "b.png",
            "image/png",
            &[7u8; 1025],
        ))
        .await;
    assert_eq!(over.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.stored_files().len(), 1);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let app = TestApp::new().await;

    let response = app
        .send(multipart_request(
            "/api/images/upload",
            "image",
            "notes.txt",
            "text/plain",
            b"hello",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Only image files are allowed"));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = TestApp::new().await;

    let response = app
        .send(multipart_request(
            "/api/images/upload",
            "avatar",
            "photo.png",
            "image/png",
            PNG_BYTES,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "No image file provided");
}

#[tokio::test]
async fn test_upload_keeps_original_extension() {
    let app = TestApp::new().await;

    let response = app
        .send(multipart_request(
            "/api/images/upload",
            "image",
            "scan.webp",
            "image/webp",
            b"RIFF0000WEBP",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".webp"));
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_uploaded_image() {
    let app = TestApp::new().await;

    let json = body_json(
        app.send(multipart_request(
            "/api/images/upload",
            "image",
            "photo.png",
            "image/png",
            PNG_BYTES,
        ))
        .await,
    )
    .await;
    let file_id = json["fileId"].as_str().unwrap().to_string();
    assert_eq!(app.stored_files().len(), 1);

    let response = app
        .send(empty_request(
            Method::DELETE,
            &format!("/api/images/{}", file_id),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Image deleted successfully");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_delete_directory_is_a_no_op() {
    let app = TestApp::new().await;
    std::fs::create_dir(app.dir.path().join("sub")).unwrap();

    let response = app
        .send(empty_request(Method::DELETE, "/api/images/sub", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(app.dir.path().join("sub").is_dir());
}

#[tokio::test]
async fn test_delete_missing_image_succeeds() {
    let app = TestApp::new().await;

    let response = app
        .send(empty_request(
            Method::DELETE,
            "/api/images/original-does-not-exist",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
}

// =============================================================================
// Storage Failures
// =============================================================================

#[tokio::test]
async fn test_storage_failure_is_server_error() {
    let store = FailingStore::default();
    let attempts = Arc::clone(&store.attempts);
    let router = create_router(
        ImageService::new(store),
        Arc::new(MockGallery::default()),
        RouterConfig::without_auth().with_tracing(false),
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(process_body(PNG_BYTES, "HELLO", 15).to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Failed to access image storage");
    // Filesystem paths stay out of the response
    assert!(!json.to_string().contains("/readonly"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validation_failure_never_reaches_store() {
    let store = FailingStore::default();
    let attempts = Arc::clone(&store.attempts);
    let router = create_router(
        ImageService::new(store),
        Arc::new(MockGallery::default()),
        RouterConfig::without_auth().with_tracing(false),
    );

    let mut body = process_body(PNG_BYTES, "HELLO", 15);
    body["blurIntensity"] = json!(99);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Service Routes
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "OK");
    assert_eq!(json["service"], "BlurCraft API");
    assert!(json["timestamp"].is_string());
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new().await;

    for uri in ["/api/does-not-exist", "/nothing/here"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Route not found");
    }
}

#[tokio::test]
async fn test_missing_static_file() {
    let app = TestApp::new().await;

    let response = app.get("/uploads/processed-missing.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/images/process")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
