use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Morphable;

/// An image blob owned by any morphable target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Image {
    pub id: Uuid,
    pub target_id: Uuid,
    pub target_name: String,
    #[serde(skip_serializing)]
    pub content: Vec<u8>,
    pub description: String,
    pub size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn new(target: &impl Morphable, content: Vec<u8>, content_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            target_id: target.morph_key(),
            target_name: target.morph_name().to_string(),
            size: content.len() as i64,
            content,
            description: String::new(),
            content_type: content_type.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Morphable for Image {
    fn morph_key(&self) -> Uuid {
        self.id
    }

    fn morph_name(&self) -> &str {
        "image"
    }
}

/// Image row without its content, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ImageMeta {
    pub id: Uuid,
    pub target_id: Uuid,
    pub target_name: String,
    pub description: String,
    pub size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
