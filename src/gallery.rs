//! Read-only gallery queries.
//!
//! The gallery, featured, search and profile endpoints read through the
//! [`GalleryQuery`] trait. The only implementation here, [`MockGallery`],
//! synthesizes listings on the fly and stores nothing; a production
//! deployment would put a real persistence layer behind the same trait.
//!
//! Mock counts are derived from a SHA-256 of the item id, so the same id
//! always yields the same likes, downloads and views.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::GalleryError;

pub const DEFAULT_PAGE_LIMIT: u32 = 12;
pub const MAX_PAGE_LIMIT: u32 = 100;

const GALLERY_TOTAL_ITEMS: u32 = 96;
const SEARCH_TOTAL_ITEMS: u32 = 16;
const SEARCH_MAX_PER_PAGE: u32 = 8;
const USER_TOTAL_ITEMS: u32 = 36;
const FEATURED_COUNT: u32 = 6;

// =============================================================================
// Types
// =============================================================================

/// Sort order for gallery listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Latest,
    Popular,
    Downloads,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Latest, SortOrder::Popular, SortOrder::Downloads];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Latest => "latest",
            SortOrder::Popular => "popular",
            SortOrder::Downloads => "downloads",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(SortOrder::Latest),
            "popular" => Ok(SortOrder::Popular),
            "downloads" => Ok(SortOrder::Downloads),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Page selection, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp page to at least 1 and limit to `1..=MAX_PAGE_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    fn new(page: u32, per_page: u32, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(per_page.max(1));
        Self {
            current_page: page,
            total_pages,
            total_items,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryUser {
    pub id: String,
    pub name: String,
    pub avatar: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub full_url: String,
    pub user: GalleryUser,
    pub likes: u32,
    pub downloads: u32,
    pub views: u32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_featured: bool,

    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPage {
    pub images: Vec<GalleryImage>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySummary {
    pub text: String,
    pub font_size: u32,
    pub color: String,
    pub position: crate::overlay::Position,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub text_overlay: OverlaySummary,
    pub blur_intensity: u32,
    pub original_dimensions: Dimensions,
    pub file_size: String,
}

/// Full record behind `GET /api/gallery/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetail {
    #[serde(flatten)]
    pub image: GalleryImage,
    pub metadata: ImageMetadata,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub images_count: u32,
    pub likes_count: u32,
    pub followers_count: u32,
    pub following_count: u32,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Query trait
// =============================================================================

/// Read-only access to published images and public profiles.
#[async_trait]
pub trait GalleryQuery: Send + Sync {
    /// Public feed, sorted.
    async fn list(&self, page: PageRequest, sort: SortOrder) -> Result<GalleryPage, GalleryError>;

    async fn featured(&self) -> Result<Vec<GalleryImage>, GalleryError>;

    /// Free-text search. An empty query is rejected.
    async fn search(&self, query: &str, page: PageRequest) -> Result<GalleryPage, GalleryError>;

    async fn get(&self, id: &str) -> Result<ImageDetail, GalleryError>;

    async fn user_images(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<GalleryPage, GalleryError>;

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, GalleryError>;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Synthesized gallery data with no backing store.
#[derive(Debug, Clone)]
pub struct MockGallery {
    asset_prefix: String,
}

impl MockGallery {
    /// `asset_prefix` is the static URL prefix used for placeholder images.
    pub fn new(asset_prefix: impl Into<String>) -> Self {
        Self {
            asset_prefix: asset_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    fn asset(&self, name: &str) -> String {
        format!("{}/{}", self.asset_prefix, name)
    }

    fn image(&self, id: String, title: String, description: String, user: GalleryUser) -> GalleryImage {
        let now = Utc::now();
        let age_secs = seeded(&id, "age", 30 * 24 * 60 * 60);
        GalleryImage {
            title,
            description,
            thumbnail_url: self.asset("mock-thumb.jpg"),
            full_url: self.asset("mock-full.jpg"),
            user,
            likes: seeded(&id, "likes", 200),
            downloads: seeded(&id, "downloads", 100),
            views: seeded(&id, "views", 500),
            tags: ["blur", "creative", "design", "art"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            created_at: now - Duration::seconds(i64::from(age_secs)),
            relevance_score: None,
            is_featured: false,
            is_public: true,
            id,
        }
    }

    fn user(&self, id: String, name: String) -> GalleryUser {
        GalleryUser {
            id,
            name,
            avatar: self.asset("mock-avatar.jpg"),
            bio: None,
        }
    }
}

impl Default for MockGallery {
    fn default() -> Self {
        Self::new(crate::processing::DEFAULT_STATIC_PREFIX)
    }
}

/// Deterministic value in `0..modulo` derived from `id` and `salt`.
fn seeded(id: &str, salt: &str, modulo: u32) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();
    let n = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    n % modulo.max(1)
}

/// Item indices (0-based, global) on the requested page.
fn page_range(page: u32, per_page: u32, total: u32) -> std::ops::Range<u32> {
    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);
    start..end
}

fn sort_images(images: &mut [GalleryImage], sort: SortOrder) {
    match sort {
        SortOrder::Latest => images.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Popular => images.sort_by(|a, b| b.likes.cmp(&a.likes)),
        SortOrder::Downloads => images.sort_by(|a, b| b.downloads.cmp(&a.downloads)),
    }
}

#[async_trait]
impl GalleryQuery for MockGallery {
    async fn list(&self, page: PageRequest, sort: SortOrder) -> Result<GalleryPage, GalleryError> {
        let mut images: Vec<GalleryImage> = page_range(page.page, page.limit, GALLERY_TOTAL_ITEMS)
            .map(|i| {
                let n = i + 1;
                let author = i % 5 + 1;
                self.image(
                    format!("gallery-{}", n),
                    format!("Gallery Image {}", n),
                    format!("Beautiful blurred image with custom text overlay {}", n),
                    self.user(
                        format!("user-{}", author),
                        format!("Creative User {}", author),
                    ),
                )
            })
            .collect();

        sort_images(&mut images, sort);

        Ok(GalleryPage {
            images,
            pagination: Pagination::new(page.page, page.limit, GALLERY_TOTAL_ITEMS),
        })
    }

    async fn featured(&self) -> Result<Vec<GalleryImage>, GalleryError> {
        Ok((1..=FEATURED_COUNT)
            .map(|n| {
                let id = format!("featured-{}", n);
                let mut image = self.image(
                    id.clone(),
                    format!("Featured Image {}", n),
                    format!("Award-winning blurred creation {}", n),
                    self.user(
                        format!("featured-user-{}", n),
                        format!("Featured Artist {}", n),
                    ),
                );
                image.likes = 500 + seeded(&id, "likes", 500);
                image.downloads = 200 + seeded(&id, "downloads", 300);
                image.views = 1000 + seeded(&id, "views", 2000);
                image.tags = vec![
                    "featured".to_string(),
                    "award-winning".to_string(),
                    "premium".to_string(),
                ];
                image.thumbnail_url = self.asset("mock-featured-thumb.jpg");
                image.full_url = self.asset("mock-featured-full.jpg");
                image.is_featured = true;
                image
            })
            .collect())
    }

    async fn search(&self, query: &str, page: PageRequest) -> Result<GalleryPage, GalleryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GalleryError::MissingQuery);
        }

        let per_page = page.limit.min(SEARCH_MAX_PER_PAGE);
        let images = page_range(page.page, per_page, SEARCH_TOTAL_ITEMS)
            .enumerate()
            .map(|(rank, i)| {
                let n = i + 1;
                let mut image = self.image(
                    format!("search-{}", n),
                    format!("Search Result {} - {}", n, query),
                    format!("Image matching \"{}\" with creative blur effects", query),
                    self.user(format!("search-user-{}", n), format!("Search User {}", n)),
                );
                image.relevance_score = Some(1.0 - rank as f64 * 0.1);
                image.thumbnail_url = self.asset("mock-search-thumb.jpg");
                image.full_url = self.asset("mock-search-full.jpg");
                image.tags = vec![query.to_string(), "blur".to_string(), "creative".to_string()];
                image
            })
            .collect();

        Ok(GalleryPage {
            images,
            pagination: Pagination::new(page.page, per_page, SEARCH_TOTAL_ITEMS),
        })
    }

    async fn get(&self, id: &str) -> Result<ImageDetail, GalleryError> {
        if id.trim().is_empty() {
            return Err(GalleryError::NotFound(id.to_string()));
        }

        let mut user = self.user("user-1".to_string(), "Creative User".to_string());
        user.bio = Some("Digital artist and designer".to_string());

        let mut image = self.image(
            id.to_string(),
            format!("Image {}", id),
            "Beautiful blurred image with custom text overlay".to_string(),
            user,
        );
        image.tags.push("typography".to_string());

        Ok(ImageDetail {
            metadata: ImageMetadata {
                text_overlay: OverlaySummary {
                    text: "CREATIVE".to_string(),
                    font_size: 64,
                    color: "#FFFFFF".to_string(),
                    position: crate::overlay::Position { x: 50, y: 50 },
                },
                blur_intensity: 15,
                original_dimensions: Dimensions {
                    width: 1920,
                    height: 1080,
                },
                file_size: "2.4 MB".to_string(),
            },
            updated_at: image.created_at,
            image,
        })
    }

    async fn user_images(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<GalleryPage, GalleryError> {
        let images = page_range(page.page, page.limit, USER_TOTAL_ITEMS)
            .map(|i| {
                let n = i + 1;
                self.image(
                    format!("img-{}-{}", user_id, n),
                    format!("User Image {}", n),
                    String::new(),
                    self.user(user_id.to_string(), "Demo User".to_string()),
                )
            })
            .collect();

        Ok(GalleryPage {
            images,
            pagination: Pagination::new(page.page, page.limit, USER_TOTAL_ITEMS),
        })
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, GalleryError> {
        Ok(UserProfile {
            id: user_id.to_string(),
            name: "Demo User".to_string(),
            email: "demo@example.com".to_string(),
            avatar: self.asset("demo-avatar.jpg"),
            bio: "Creative professional using BlurCraft".to_string(),
            images_count: USER_TOTAL_ITEMS,
            likes_count: seeded(user_id, "likes", 200),
            followers_count: seeded(user_id, "followers", 100),
            following_count: seeded(user_id, "following", 50),
            created_at: Utc::now(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
