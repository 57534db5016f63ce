//! HTTP client for the BlurCraft REST API.

use std::time::Duration;

use bytes::Bytes;
use http::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ClientError;
use crate::gallery::{GalleryPage, SortOrder};

use super::builder::{SelectedFile, Submission};

/// Request timeout for API calls. Processing may fetch a remote image, so
/// this is longer than the server's own fetch timeout.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub processed_image_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_url: String,
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub total_likes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub user: AccountUser,
    pub token: String,
}

/// Client for the `/api` endpoints.
///
/// Each call is independent; nothing prevents a caller from issuing a
/// second `process` before the first returns.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach a bearer token to every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.authorize(request).send().await?;
        decode(response).await
    }

    /// Submit an image for processing.
    pub async fn process(&self, submission: &Submission) -> Result<ProcessResponse, ClientError> {
        debug!(
            file = %submission.file.name,
            blur = submission.blur_intensity,
            "Submitting image for processing"
        );
        let request = self
            .http
            .post(self.url("/images/process"))
            .json(&submission.to_request());
        self.send(request).await
    }

    /// Upload a raw file as multipart field `image`.
    pub async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse, ClientError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part("image", part);
        let request = self.http.post(self.url("/images/upload")).multipart(form);
        self.send(request).await
    }

    pub async fn delete_image(&self, image_id: &str) -> Result<(), ClientError> {
        let request = self
            .http
            .delete(self.url(&format!("/images/{}", urlencoding::encode(image_id))));
        let _: Value = self.send(request).await?;
        Ok(())
    }

    pub async fn like_image(&self, image_id: &str) -> Result<LikeResponse, ClientError> {
        let request = self
            .http
            .post(self.url(&format!("/images/{}/like", urlencoding::encode(image_id))));
        self.send(request).await
    }

    pub async fn gallery(
        &self,
        page: u32,
        limit: u32,
        sort: SortOrder,
    ) -> Result<GalleryPage, ClientError> {
        let request = self.http.get(self.url("/gallery")).query(&[
            ("page", page.to_string()),
            ("limit", limit.to_string()),
            ("sort", sort.as_str().to_string()),
        ]);
        self.send(request).await
    }

    pub async fn user_images(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<GalleryPage, ClientError> {
        let request = self
            .http
            .get(self.url(&format!("/users/{}/images", urlencoding::encode(user_id))))
            .query(&[("page", page.to_string()), ("limit", limit.to_string())]);
        self.send(request).await
    }

    /// Sign in and keep the issued token for later calls.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<SignInResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/auth/signin"))
            .json(&json!({ "email": email, "password": password }));
        let response: SignInResponse = self.send(request).await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    /// Fetch raw bytes from an absolute URL, e.g. a returned reference.
    pub async fn download(&self, url: &str) -> Result<Bytes, ClientError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("Failed to download {}", url),
            });
        }
        Ok(response.bytes().await?)
    }
}

/// Unwrap the `{ success, ... }` envelope.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    let value: Option<Value> = serde_json::from_slice(&body).ok();

    let failed = !status.is_success()
        || value
            .as_ref()
            .and_then(|v| v.get("success"))
            .and_then(Value::as_bool)
            == Some(false);

    if failed {
        let message = value
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let value = value.ok_or_else(|| ClientError::Http("response is not JSON".to_string()))?;
    serde_json::from_value(value).map_err(|e| ClientError::Http(e.to_string()))
}
