use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Morphable, TagResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Published,
    Preparing,
    /// Soft-delete marker; the row stays until explicitly deleted.
    Deleted,
}

impl ShareStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareStatus::Published => "published",
            ShareStatus::Preparing => "preparing",
            ShareStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShareStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "published" => Ok(ShareStatus::Published),
            "preparing" => Ok(ShareStatus::Preparing),
            "deleted" => Ok(ShareStatus::Deleted),
            _ => Err(format!("Invalid share status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Share {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub image_id: Option<Uuid>,
    pub status: ShareStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Share {
    pub fn new(user_id: Uuid, slug: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            user_id,
            slug: slug.into(),
            name: name.into(),
            description: String::new(),
            image_id: None,
            status: ShareStatus::Preparing,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Morphable for Share {
    fn morph_key(&self) -> Uuid {
        self.id
    }

    fn morph_name(&self) -> &str {
        "share"
    }
}

#[derive(Debug, Deserialize)]
pub struct ShareInput {
    pub user_id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<ShareStatus>,
    #[serde(default)]
    pub must_tags: Vec<String>,
    #[serde(default)]
    pub any_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub image_id: Option<Uuid>,
    pub status: ShareStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Share> for ShareResponse {
    fn from(share: Share) -> Self {
        Self {
            id: share.id,
            user_id: share.user_id,
            slug: share.slug,
            name: share.name,
            description: share.description,
            image_id: share.image_id,
            status: share.status,
            created_at: share.created_at,
            updated_at: share.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShareDetail {
    #[serde(flatten)]
    pub share: ShareResponse,
    pub must_tags: Vec<TagResponse>,
    pub any_tags: Vec<TagResponse>,
}

impl Share {
    pub fn into_detail(self, must_tags: Vec<TagResponse>, any_tags: Vec<TagResponse>) -> ShareDetail {
        ShareDetail {
            share: self.into(),
            must_tags,
            any_tags,
        }
    }
}
