//! Gallery listing integration tests.
//!
//! Tests verify:
//! - Default paging and pagination metadata
//! - Sort orders and the fallback for unknown sorts
//! - Search, including the missing query error
//! - Image detail, featured images and user pages

use axum::http::StatusCode;

use super::test_utils::{body_json, TestApp};

#[tokio::test]
async fn test_gallery_default_page() {
    let app = TestApp::new().await;

    let response = app.get("/api/gallery").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["images"].as_array().unwrap().len(), 12);

    let pagination = &json["pagination"];
    assert_eq!(pagination["currentPage"], 1);
    assert_eq!(pagination["totalPages"], 8);
    assert_eq!(pagination["totalItems"], 96);
    assert_eq!(pagination["hasNextPage"], true);
    assert_eq!(pagination["hasPrevPage"], false);

    assert_eq!(json["filters"]["sort"], "latest");
    assert_eq!(
        json["filters"]["availableSorts"],
        serde_json::json!(["latest", "popular", "downloads"])
    );
}

#[tokio::test]
async fn test_gallery_last_page() {
    let app = TestApp::new().await;

    let json = body_json(app.get("/api/gallery?page=8&limit=12").await).await;
    assert_eq!(json["images"].as_array().unwrap().len(), 12);
    assert_eq!(json["pagination"]["hasNextPage"], false);
    assert_eq!(json["pagination"]["hasPrevPage"], true);

    let json = body_json(app.get("/api/gallery?page=9&limit=12").await).await;
    assert!(json["images"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_gallery_popular_sort() {
    let app = TestApp::new().await;

    let json = body_json(app.get("/api/gallery?sort=popular&limit=20").await).await;
    assert_eq!(json["filters"]["sort"], "popular");

    let likes: Vec<u64> = json["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["likes"].as_u64().unwrap())
        .collect();
    assert_eq!(likes.len(), 20);
    assert!(likes.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_gallery_unknown_sort_falls_back() {
    let app = TestApp::new().await;

    let response = app.get("/api/gallery?sort=random").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["filters"]["sort"], "latest");
}

#[tokio::test]
async fn test_gallery_is_deterministic() {
    let app = TestApp::new().await;

    let first = body_json(app.get("/api/gallery?sort=downloads").await).await;
    let second = body_json(app.get("/api/gallery?sort=downloads").await).await;

    let ids = |json: &serde_json::Value| -> Vec<String> {
        json["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[tokio::test]
async fn test_gallery_rejects_non_numeric_page() {
    let app = TestApp::new().await;

    let response = app.get("/api/gallery?page=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_featured() {
    let app = TestApp::new().await;

    let json = body_json(app.get("/api/gallery/featured").await).await;
    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 6);
    assert!(images.iter().all(|i| i["isFeatured"] == true));
    assert!(json.get("pagination").is_none());
}

#[tokio::test]
async fn test_search() {
    let app = TestApp::new().await;

    let response = app.get("/api/gallery/search?q=sunset").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["query"], "sunset");

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 8);
    assert_eq!(images[0]["relevanceScore"], 1.0);
    assert!(images
        .iter()
        .all(|i| i["tags"].as_array().unwrap().contains(&serde_json::json!("sunset"))));

    assert_eq!(json["pagination"]["totalItems"], 16);
    assert_eq!(json["pagination"]["totalPages"], 2);
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = TestApp::new().await;

    for uri in ["/api/gallery/search", "/api/gallery/search?q=%20%20"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Search query is required");
    }
}

#[tokio::test]
async fn test_image_detail() {
    let app = TestApp::new().await;

    let response = app.get("/api/gallery/gallery-3").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let image = &json["image"];
    assert_eq!(image["id"], "gallery-3");
    assert!(image["title"].is_string());
    assert_eq!(image["metadata"]["blurIntensity"], 15);
    assert_eq!(image["metadata"]["textOverlay"]["text"], "CREATIVE");
    assert!(image["updatedAt"].is_string());
}

#[tokio::test]
async fn test_user_profile_and_images() {
    let app = TestApp::new().await;

    let json = body_json(app.get("/api/users/user-2").await).await;
    assert_eq!(json["user"]["id"], "user-2");
    assert_eq!(json["user"]["imagesCount"], 36);

    let json = body_json(app.get("/api/users/user-2/images?limit=10&page=4").await).await;
    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 6);
    assert!(images.iter().all(|i| i["user"]["id"] == "user-2"));
    assert_eq!(json["pagination"]["totalPages"], 4);
}
