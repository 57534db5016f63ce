//! HTTP request handlers for the BlurCraft API.
//!
//! # Endpoints
//!
//! - `POST /api/images/process` - Store an image with effect hints
//! - `POST /api/images/upload` - Store a raw multipart upload
//! - `DELETE /api/images/{imageId}` - Delete a stored image
//! - `GET /api/gallery...` - Mock gallery reads
//! - `/api/auth/...`, `/api/users/...` - Mock account endpoints
//! - `GET /health` - Health check endpoint
//!
//! Every failure is rendered as `{ "success": false, "error": "..." }`.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::data_uri::is_image_mime;
use crate::error::{ApiError, FieldError, GalleryError, ProcessError, StorageError, UploadError};
use crate::gallery::{
    GalleryImage, GalleryQuery, ImageDetail, PageRequest, Pagination, SortOrder, UserProfile,
};
use crate::overlay::parse_process_body;
use crate::processing::ImageService;
use crate::storage::AssetStore;

use super::auth::{OptionalAuth, TokenAuth};

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "image";

const DEMO_USER_ID: &str = "1";
const DEMO_USER_NAME: &str = "Demo User";
const DEMO_USER_EMAIL: &str = "demo@example.com";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Built once at startup and cloned into every handler via Axum's State
/// extractor; clones share the same service, gallery and key.
pub struct AppState<S: AssetStore> {
    /// Storage pipeline for process, upload and delete
    pub images: Arc<ImageService<S>>,

    /// Read-only gallery backend
    pub gallery: Arc<dyn GalleryQuery>,

    /// Issues tokens on sign-in and decodes them for optional auth
    pub auth: TokenAuth,

    /// Origin used to absolutize returned URLs (None = derive from `Host`)
    pub public_base_url: Option<String>,
}

impl<S: AssetStore> AppState<S> {
    pub fn new(images: ImageService<S>, gallery: Arc<dyn GalleryQuery>, auth: TokenAuth) -> Self {
        Self {
            images: Arc::new(images),
            gallery,
            auth,
            public_base_url: None,
        }
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Scheme and host the client used, e.g. `http://localhost:3001`.
    pub fn origin(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(url) = &self.public_base_url {
            return Some(url.clone());
        }
        let host = headers.get(header::HOST)?.to_str().ok()?;
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        Some(format!("{}://{}", scheme, host))
    }

    fn absolute(&self, headers: &HeaderMap, path: &str) -> String {
        match self.origin(headers) {
            Some(origin) => format!("{}{}", origin, path),
            None => path.to_string(),
        }
    }

    fn avatar(&self, name: &str) -> String {
        format!("{}/{}", self.images.static_prefix(), name)
    }
}

impl<S: AssetStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            images: Arc::clone(&self.images),
            gallery: Arc::clone(&self.gallery),
            auth: self.auth.clone(),
            public_base_url: self.public_base_url.clone(),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PageQueryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQueryParams {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GalleryQueryParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,

    /// `latest`, `popular` or `downloads`; anything else means `latest`
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQueryParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::BadRequest(format!("Invalid query parameters: {}", e.body_text())))
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

/// Non-empty string field of a JSON object.
fn string_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Human-readable error message
    pub error: String,

    /// Per-field failures for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: Some(details),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,

    /// Service version
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub processed_image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_url: String,

    /// Filename without extension, accepted by the delete endpoint
    pub file_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub success: bool,
    pub liked: bool,
    pub total_likes: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortFilters {
    pub sort: SortOrder,
    pub available_sorts: Vec<SortOrder>,
}

#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    pub images: Vec<GalleryImage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SortFilters>,
}

impl ImageListResponse {
    fn new(images: Vec<GalleryImage>) -> Self {
        Self {
            success: true,
            query: None,
            images,
            pagination: None,
            filters: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageDetailResponse {
    pub success: bool,
    pub image: ImageDetail,
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub user: AccountUser,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Log by severity and render the uniform error body.
///
/// - 5xx errors are logged at ERROR level
/// - 404s at DEBUG level (common and expected)
/// - other 4xx errors at WARN level
fn error_response(status: StatusCode, error_type: &str, body: ErrorResponse) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            body.error
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            body.error
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            body.error
        );
    }

    (status, Json(body)).into_response()
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        match self {
            ProcessError::Validation(err) => {
                // Top-level message names every field so it is readable on its own
                let message = err.to_string();
                error_response(
                    StatusCode::BAD_REQUEST,
                    "validation_failed",
                    ErrorResponse::with_details(message, err.0),
                )
            }
            ProcessError::InputMissing | ProcessError::InvalidImageData(_) => error_response(
                StatusCode::BAD_REQUEST,
                "invalid_input",
                ErrorResponse::new(self.to_string()),
            ),
            ProcessError::Fetch(err) => error_response(
                StatusCode::BAD_REQUEST,
                "fetch_failed",
                ErrorResponse::new(format!("Failed to fetch image from URL: {}", err)),
            ),
            ProcessError::Storage(err) => err.into_response(),
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            UploadError::MissingFile => "missing_file",
            UploadError::TooLarge { .. } => "file_too_large",
            UploadError::NotAnImage { .. } => "not_an_image",
            UploadError::Multipart(_) => "invalid_multipart",
            UploadError::Storage(_) => "storage_error",
        };
        match self {
            UploadError::Storage(err) => err.into_response(),
            other => error_response(
                StatusCode::BAD_REQUEST,
                error_type,
                ErrorResponse::new(other.to_string()),
            ),
        }
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        // The path stays in the log, not in the response
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        error!(
            error_type = "storage_error",
            status = status.as_u16(),
            "Server error: {}",
            self
        );
        (
            status,
            Json(ErrorResponse::new("Failed to access image storage")),
        )
            .into_response()
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            GalleryError::MissingQuery => (StatusCode::BAD_REQUEST, "missing_query"),
            GalleryError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GalleryError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "gallery_error"),
        };
        error_response(status, error_type, ErrorResponse::new(self.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        error_response(status, error_type, ErrorResponse::new(self.to_string()))
    }
}

/// Errors from handlers that touch more than one pipeline.
#[derive(Debug)]
pub enum HandlerError {
    Api(ApiError),
    Gallery(GalleryError),
}

impl From<ApiError> for HandlerError {
    fn from(err: ApiError) -> Self {
        HandlerError::Api(err)
    }
}

impl From<GalleryError> for HandlerError {
    fn from(err: GalleryError) -> Self {
        HandlerError::Gallery(err)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Api(err) => err.into_response(),
            HandlerError::Gallery(err) => err.into_response(),
        }
    }
}

// =============================================================================
// Image Handlers
// =============================================================================

/// Handle image processing requests.
///
/// # Endpoint
///
/// `POST /api/images/process`
///
/// # Request Body
///
/// ```json
/// {
///   "imageData": "data:image/png;base64,iVBORw0KGgo...",
///   "textOverlay": { "text": "HELLO", "fontSize": 48, "color": "#FFFFFF" },
///   "blurIntensity": 15
/// }
/// ```
///
/// `imageUrl` may be given instead of `imageData`.
///
/// # Response
///
/// - `200 OK`: `{ "success": true, "processedImageUrl": ".../uploads/processed-....png?blur=15&text=HELLO" }`
/// - `400 Bad Request`: Validation failure (with `details`), missing input, bad payload or fetch failure
/// - `500 Internal Server Error`: Storage failure
pub async fn process_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProcessResponse>, Response> {
    let body = json_body(body).map_err(IntoResponse::into_response)?;
    let request = parse_process_body(&body)
        .map_err(|e| ProcessError::from(e).into_response())?;

    let origin = state.origin(&headers);
    let processed = state
        .images
        .process(&request, origin.as_deref())
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(ProcessResponse {
        success: true,
        processed_image_url: state.absolute(&headers, &processed.reference),
    }))
}

/// Handle multipart image uploads.
///
/// # Endpoint
///
/// `POST /api/images/upload` with multipart field `image`
///
/// # Response
///
/// - `200 OK`: `{ "success": true, "fileUrl": "...", "fileId": "original-..." }`
/// - `400 Bad Request`: No file, not an image, or larger than the upload limit
/// - `500 Internal Server Error`: Storage failure
///
/// The file is streamed chunk by chunk and rejected as soon as it passes the
/// limit.
pub async fn upload_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    let limit = state.images.max_upload_bytes();
    let mut multipart = multipart.map_err(|e| UploadError::Multipart(e.body_text()))?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_image_mime(&content_type) {
            return Err(UploadError::NotAnImage { content_type });
        }

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            let size = (data.len() + chunk.len()) as u64;
            if size > limit {
                return Err(UploadError::TooLarge { size, limit });
            }
            data.extend_from_slice(&chunk);
        }

        let asset = state
            .images
            .save_upload(data.freeze(), file_name.as_deref(), &content_type)
            .await?;

        return Ok(Json(UploadResponse {
            success: true,
            file_url: state.absolute(&headers, &state.images.asset_path(&asset)),
            file_id: asset.id,
        }));
    }

    Err(UploadError::MissingFile)
}

fn multipart_error(err: MultipartError, limit: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // Request body limit tripped before the field ended; exact size unknown
        UploadError::TooLarge {
            size: limit.saturating_add(1),
            limit,
        }
    } else {
        UploadError::Multipart(err.body_text())
    }
}

/// Handle image deletion.
///
/// # Endpoint
///
/// `DELETE /api/images/{imageId}`
///
/// Succeeds whether or not the image exists.
pub async fn delete_image_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    Path(image_id): Path<String>,
) -> Result<Json<MessageResponse>, StorageError> {
    state.images.delete(&image_id).await?;
    Ok(Json(MessageResponse::ok("Image deleted successfully")))
}

/// `POST /api/images/{imageId}/like`
pub async fn like_image_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    Path(image_id): Path<String>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<LikeResponse>, GalleryError> {
    let detail = state.gallery.get(&image_id).await?;
    debug!(
        image = %image_id,
        user = user.as_ref().map(|u| u.id.as_str()).unwrap_or(DEMO_USER_ID),
        "Image liked"
    );
    Ok(Json(LikeResponse {
        success: true,
        liked: true,
        total_likes: detail.image.likes + 1,
    }))
}

/// `GET /api/images/user`: images of the calling user.
pub async fn own_images_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    OptionalAuth(user): OptionalAuth,
    query: Result<Query<PageQueryParams>, QueryRejection>,
) -> Result<Json<ImageListResponse>, HandlerError> {
    let params = query_params(query)?;
    let user_id = user.map(|u| u.id).unwrap_or_else(|| DEMO_USER_ID.to_string());
    user_page(&state, &user_id, &params).await
}

/// `GET /api/images/user/{userId}` and `GET /api/users/{userId}/images`
pub async fn user_images_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    query: Result<Query<PageQueryParams>, QueryRejection>,
) -> Result<Json<ImageListResponse>, HandlerError> {
    let params = query_params(query)?;
    user_page(&state, &user_id, &params).await
}

async fn user_page<S: AssetStore>(
    state: &AppState<S>,
    user_id: &str,
    params: &PageQueryParams,
) -> Result<Json<ImageListResponse>, HandlerError> {
    let page = state
        .gallery
        .user_images(user_id, params.page_request())
        .await?;

    let mut response = ImageListResponse::new(page.images);
    response.pagination = Some(page.pagination);
    Ok(Json(response))
}

// =============================================================================
// Gallery Handlers
// =============================================================================

/// Handle gallery feed requests.
///
/// # Endpoint
///
/// `GET /api/gallery?page=1&limit=12&sort=latest`
pub async fn gallery_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    OptionalAuth(user): OptionalAuth,
    query: Result<Query<GalleryQueryParams>, QueryRejection>,
) -> Result<Json<ImageListResponse>, HandlerError> {
    let params = query_params(query)?;
    let sort = params
        .sort
        .as_deref()
        .and_then(|s| s.parse::<SortOrder>().ok())
        .unwrap_or_default();

    if let Some(user) = &user {
        debug!(user = %user.id, "Gallery requested by signed-in user");
    }

    let page = state
        .gallery
        .list(PageRequest::new(params.page, params.limit), sort)
        .await?;

    let mut response = ImageListResponse::new(page.images);
    response.pagination = Some(page.pagination);
    response.filters = Some(SortFilters {
        sort,
        available_sorts: SortOrder::ALL.to_vec(),
    });
    Ok(Json(response))
}

/// `GET /api/gallery/featured`
pub async fn featured_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<ImageListResponse>, GalleryError> {
    let images = state.gallery.featured().await?;
    Ok(Json(ImageListResponse::new(images)))
}

/// Handle gallery search.
///
/// # Endpoint
///
/// `GET /api/gallery/search?q=sunset`
///
/// # Errors
///
/// - `400 Bad Request`: `q` missing or blank
pub async fn search_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<SearchQueryParams>, QueryRejection>,
) -> Result<Json<ImageListResponse>, HandlerError> {
    let params = query_params(query)?;
    let q = params.q.unwrap_or_default();

    let page = state
        .gallery
        .search(&q, PageRequest::new(params.page, params.limit))
        .await?;

    let mut response = ImageListResponse::new(page.images);
    response.query = Some(q.trim().to_string());
    response.pagination = Some(page.pagination);
    Ok(Json(response))
}

/// `GET /api/gallery/{id}`
pub async fn gallery_image_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<ImageDetailResponse>, GalleryError> {
    let image = state.gallery.get(&id).await?;
    Ok(Json(ImageDetailResponse {
        success: true,
        image,
    }))
}

// =============================================================================
// Account Handlers
// =============================================================================

/// Handle sign-in.
///
/// # Endpoint
///
/// `POST /api/auth/signin` with `{ "email": "...", "password": "..." }`
///
/// Any non-empty credentials are accepted; the response carries a signed
/// token for the demo user.
pub async fn sign_in_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AccountResponse>, ApiError> {
    let body = json_body(body)?;
    let (Some(email), Some(_password)) =
        (string_field(&body, "email"), string_field(&body, "password"))
    else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let user = AccountUser {
        id: DEMO_USER_ID.to_string(),
        name: DEMO_USER_NAME.to_string(),
        email: email.to_string(),
        avatar: state.avatar("demo-avatar.jpg"),
        bio: None,
        created_at: None,
    };
    let token = state.auth.issue(&user.id, &user.email, &user.name);

    Ok(Json(AccountResponse {
        success: true,
        user,
        token: Some(token),
    }))
}

/// `POST /api/auth/signup` with `{ "name", "email", "password" }`
pub async fn sign_up_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AccountResponse>, ApiError> {
    let body = json_body(body)?;
    let (Some(name), Some(email), Some(_password)) = (
        string_field(&body, "name"),
        string_field(&body, "email"),
        string_field(&body, "password"),
    ) else {
        return Err(ApiError::BadRequest(
            "Name, email and password are required".to_string(),
        ));
    };

    let user = AccountUser {
        id: DEMO_USER_ID.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        avatar: state.avatar("default-avatar.jpg"),
        bio: None,
        created_at: None,
    };
    let token = state.auth.issue(&user.id, &user.email, &user.name);

    Ok(Json(AccountResponse {
        success: true,
        user,
        token: Some(token),
    }))
}

/// `POST /api/auth/signout`. Tokens are stateless, so this only acknowledges.
pub async fn sign_out_handler() -> Json<MessageResponse> {
    Json(MessageResponse::ok("Signed out successfully"))
}

/// `GET /api/auth/me`: the token's user, or the demo user without one.
pub async fn me_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    OptionalAuth(user): OptionalAuth,
) -> Json<AccountResponse> {
    let (id, name, email) = match user {
        Some(user) => (user.id, user.name, user.email),
        None => (
            DEMO_USER_ID.to_string(),
            DEMO_USER_NAME.to_string(),
            DEMO_USER_EMAIL.to_string(),
        ),
    };

    Json(AccountResponse {
        success: true,
        user: AccountUser {
            id,
            name,
            email,
            avatar: state.avatar("demo-avatar.jpg"),
            bio: None,
            created_at: Some(Utc::now()),
        },
        token: None,
    })
}

/// `GET /api/users/{userId}`
pub async fn user_profile_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfileResponse>, GalleryError> {
    let user = state.gallery.user_profile(&user_id).await?;
    Ok(Json(UserProfileResponse {
        success: true,
        user,
    }))
}

/// `PUT /api/users/{userId}` with optional `name` and `bio`.
///
/// Nothing is persisted; the updated profile is echoed back.
pub async fn update_user_handler<S: AssetStore + 'static>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AccountResponse>, ApiError> {
    let body = json_body(body)?;

    Ok(Json(AccountResponse {
        success: true,
        user: AccountUser {
            id: user_id,
            name: string_field(&body, "name")
                .unwrap_or(DEMO_USER_NAME)
                .to_string(),
            email: DEMO_USER_EMAIL.to_string(),
            avatar: state.avatar("demo-avatar.jpg"),
            bio: Some(string_field(&body, "bio").unwrap_or("Updated bio").to_string()),
            created_at: None,
        },
        token: None,
    }))
}

// =============================================================================
// Service Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "OK",
///   "timestamp": "2024-01-01T00:00:00Z",
///   "service": "BlurCraft API",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        service: "BlurCraft API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fallback for unmatched routes.
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Last-resort response for a panicking handler.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
        .into_response()
}

// =============================================================================
// Tests
// =============================================================================
