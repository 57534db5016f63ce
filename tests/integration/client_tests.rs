//! Client integration tests against a live server.
//!
//! Tests verify:
//! - A submission round-trips through process and download unchanged
//! - Upload and delete through the client
//! - Gallery paging decodes into typed pages
//! - Sign-in stores a token that unlocks protected routes
//! - Server errors surface as `ClientError::Api` with the server's message

use std::net::SocketAddr;

use blurcraft::client::{ApiClient, SelectedFile, SubmissionBuilder};
use blurcraft::{ClientError, RouterConfig, SortOrder};

use super::test_utils::{spawn_server, TestApp, PNG_BYTES};

async fn live_app(config: RouterConfig) -> (TestApp, SocketAddr) {
    let app = TestApp::with_config(config).await;
    let addr = spawn_server(app.router.clone()).await;
    (app, addr)
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(format!("http://{}/api/", addr)).unwrap()
}

fn png_file() -> SelectedFile {
    SelectedFile::from_bytes("photo.png", "image/png", PNG_BYTES)
}

#[tokio::test]
async fn test_process_and_download() {
    let (app, addr) = live_app(RouterConfig::without_auth()).await;
    let api = client(addr);
    assert_eq!(api.base_url(), format!("http://{}/api", addr));

    let mut builder = SubmissionBuilder::new();
    builder.select_file(png_file()).unwrap();
    builder.overlay_mut().text = "HELLO".to_string();
    builder.set_blur_intensity(15);
    let submission = builder.build().unwrap();

    let response = api.process(&submission).await.unwrap();
    let url = response.processed_image_url;
    assert!(
        url.starts_with(&format!("http://{}/uploads/processed-", addr)),
        "got {}",
        url
    );
    assert!(url.ends_with("?blur=15&text=HELLO"));

    let bytes = api.download(&url).await.unwrap();
    assert_eq!(bytes.as_ref(), PNG_BYTES);
    assert_eq!(app.stored_files().len(), 1);
}

#[tokio::test]
async fn test_invalid_submission_surfaces_server_message() {
    let (app, addr) = live_app(RouterConfig::without_auth()).await;
    let api = client(addr);

    let mut builder = SubmissionBuilder::new();
    builder.select_file(png_file()).unwrap();
    builder.overlay_mut().color = "red".to_string();
    let submission = builder.build().unwrap();

    match api.process(&submission).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("textOverlay.color"), "got {}", message);
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_then_delete() {
    let (app, addr) = live_app(RouterConfig::without_auth()).await;
    let api = client(addr);

    let uploaded = api.upload(&png_file()).await.unwrap();
    assert!(uploaded.file_id.starts_with("original-"));
    assert_eq!(api.download(&uploaded.file_url).await.unwrap().as_ref(), PNG_BYTES);
    assert_eq!(app.stored_files().len(), 1);

    api.delete_image(&uploaded.file_id).await.unwrap();
    assert!(app.stored_files().is_empty());

    // Deleting again is still a success
    api.delete_image(&uploaded.file_id).await.unwrap();
}

#[tokio::test]
async fn test_upload_rejected_type() {
    let (_app, addr) = live_app(RouterConfig::without_auth()).await;
    let api = client(addr);

    let file = SelectedFile::from_bytes("notes.txt", "text/plain", &b"hello"[..]);
    let err = api.upload(&file).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_gallery_pages() {
    let (_app, addr) = live_app(RouterConfig::without_auth()).await;
    let api = client(addr);

    let page = api.gallery(2, 10, SortOrder::Popular).await.unwrap();
    assert_eq!(page.images.len(), 10);
    assert_eq!(page.pagination.current_page, 2);
    assert!(page.pagination.has_prev_page);
    assert!(page
        .images
        .windows(2)
        .all(|w| w[0].likes >= w[1].likes));

    let page = api.user_images("user-1", 1, 50).await.unwrap();
    assert_eq!(page.images.len(), 36);
    assert!(!page.pagination.has_next_page);
}

#[tokio::test]
async fn test_sign_in_unlocks_like() {
    let (_app, addr) = live_app(RouterConfig::new("client-test-secret")).await;
    let mut api = client(addr);

    let err = api.like_image("gallery-1").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 401, .. }), "got {:?}", err);

    let signed_in = api.sign_in("ada@example.com", "hunter2").await.unwrap();
    assert_eq!(signed_in.user.email, "ada@example.com");
    assert_eq!(api.token(), Some(signed_in.token.as_str()));

    let liked = api.like_image("gallery-1").await.unwrap();
    assert!(liked.liked);
    assert!(liked.total_likes >= 1);
}

#[tokio::test]
async fn test_unreachable_server_is_http_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(addr);
    let err = api.gallery(1, 12, SortOrder::Latest).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)), "got {:?}", err);
}
