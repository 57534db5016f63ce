//! Bearer token authentication for BlurCraft.
//!
//! Tokens are HMAC-SHA256 signed claim sets. There is no user store behind
//! them: sign-in accepts any credentials and the token only proves that this
//! server issued it.
//!
//! # Token Format
//!
//! ```text
//! token     = base64url(claims_json) "." hex(signature)
//! signature = HMAC-SHA256(secret_key, base64url(claims_json))
//! ```
//!
//! `claims_json` carries `sub`, `email`, `name` and `exp` (Unix seconds).
//!
//! # Rejections
//!
//! - No `Authorization: Bearer` header: 401 `Access token required`
//! - Malformed, forged or expired token: 403 `Invalid or expired token`
//!
//! # Example
//!
//! ```rust
//! use blurcraft::server::auth::TokenAuth;
//! use std::time::Duration;
//!
//! let auth = TokenAuth::new("my-secret-key").with_ttl(Duration::from_secs(3600));
//! let token = auth.issue("1", "demo@example.com", "Demo User");
//!
//! let claims = auth.verify(&token).unwrap();
//! assert_eq!(claims.sub, "1");
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;

/// Default token lifetime: 7 days.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// =============================================================================
// Types
// =============================================================================

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,

    /// Expiry (Unix epoch seconds)
    pub exp: u64,
}

/// The authenticated caller, attached to request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Authentication error types.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No bearer token on the request
    MissingToken,

    /// Token is not `payload.signature`, or either half fails to decode
    MalformedToken,

    /// Signature does not match the payload
    InvalidSignature,

    /// Token has expired
    Expired {
        /// When the token expired
        expired_at: u64,
        /// Current time
        current_time: u64,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Access token required"),
            AuthError::MalformedToken => write!(f, "Malformed token"),
            AuthError::InvalidSignature => write!(f, "Invalid token signature"),
            AuthError::Expired {
                expired_at,
                current_time,
            } => write!(
                f,
                "Token expired at {} (current time: {})",
                expired_at, current_time
            ),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::MalformedToken | AuthError::InvalidSignature | AuthError::Expired { .. } => {
                (StatusCode::FORBIDDEN, "Invalid or expired token".to_string())
            }
        };

        // Forged signatures are worth a warning; the rest is routine
        match &self {
            AuthError::InvalidSignature => {
                warn!(status = status.as_u16(), "Authentication failed: {}", self);
            }
            _ => {
                debug!(status = status.as_u16(), "Authentication failed: {}", self);
            }
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// =============================================================================
// Token Authentication
// =============================================================================

/// Issues and verifies HMAC-signed bearer tokens.
#[derive(Clone)]
pub struct TokenAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,

    ttl: Duration,
}

impl TokenAuth {
    /// Create a new authenticator with the given secret key.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Authenticator with a random per-process key. Tokens it issues do not
    /// survive a restart.
    pub fn ephemeral() -> Self {
        Self::new(uuid::Uuid::new_v4().as_bytes())
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a user, valid for the configured TTL.
    pub fn issue(&self, id: &str, email: &str, name: &str) -> String {
        self.issue_claims(&Claims {
            sub: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            exp: now_secs().saturating_add(self.ttl.as_secs()),
        })
    }

    /// Issue a token for an explicit claim set.
    pub fn issue_claims(&self, claims: &Claims) -> String {
        // Claims holds only strings and an integer
        let json = serde_json::to_vec(claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.compute_signature(&payload));
        format!("{}.{}", payload, signature)
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;

        let provided_sig = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;
        let expected_sig = self.compute_signature(payload);

        // Constant-time comparison
        if !bool::from(provided_sig.ct_eq(&expected_sig)) {
            return Err(AuthError::InvalidSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::MalformedToken)?;

        let current_time = now_secs();
        if current_time > claims.exp {
            return Err(AuthError::Expired {
                expired_at: claims.exp,
                current_time,
            });
        }

        Ok(claims)
    }

    /// Compute the HMAC-SHA256 signature of an encoded payload.
    fn compute_signature(&self, payload: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Token from `Authorization: Bearer <token>`, if present and non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware requiring a valid bearer token.
///
/// On success the caller is stored as an [`AuthUser`] request extension.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware, routing::delete};
/// use blurcraft::server::auth::{TokenAuth, require_auth};
///
/// let auth = TokenAuth::new("secret-key");
/// let app = Router::new()
///     .route("/images/{imageId}", delete(delete_handler))
///     .layer(middleware::from_fn_with_state(auth, require_auth));
/// ```
pub async fn require_auth(
    State(auth): State<TokenAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let claims = auth.verify(token)?;

    debug!(user = %claims.sub, "Authenticated request");
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Axum extractor for optional authentication.
///
/// Yields the caller set by [`require_auth`] if that ran, otherwise tries the
/// bearer token against a [`TokenAuth`] request extension. Missing or invalid
/// tokens are not an error; the request simply proceeds anonymously.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(OptionalAuth(Some(user.clone())));
        }

        let user = match (parts.extensions.get::<TokenAuth>(), bearer_token(&parts.headers)) {
            (Some(auth), Some(token)) => auth.verify(token).ok().map(AuthUser::from),
            _ => None,
        };

        Ok(OptionalAuth(user))
    }
}

// =============================================================================
// Tests
// =============================================================================
