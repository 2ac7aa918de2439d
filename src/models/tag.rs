use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Morphable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub level: i64,
    pub color: String,
    pub bg_color: String,
    pub has_children: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// An unsaved root tag. Id and timestamps are assigned on create.
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            name: name.into(),
            user_id,
            parent_id: None,
            level: 0,
            color: String::new(),
            bg_color: String::new(),
            has_children: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

impl Morphable for Tag {
    fn morph_key(&self) -> Uuid {
        self.id
    }

    fn morph_name(&self) -> &str {
        "tag"
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTag {
    pub user_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub color: Option<String>,
    pub bg_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub detach: bool,
    pub color: Option<String>,
    pub bg_color: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub level: i64,
    pub color: String,
    pub bg_color: String,
    pub has_children: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            parent_id: tag.parent_id,
            level: tag.level,
            color: tag.color,
            bg_color: tag.bg_color,
            has_children: tag.has_children,
            created_at: tag.created_at,
            updated_at: tag.updated_at,
        }
    }
}
