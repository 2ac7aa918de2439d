use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Tag;

/// Partition of the tag join table. `MustTag` reads as "all of", `AnyTag`
/// as "at least one of"; the store treats both as opaque keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    MustTag,
    AnyTag,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::MustTag => "must_tag",
            TagKind::AnyTag => "any_tag",
        }
    }
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Taggable {
    pub tag_id: Uuid,
    pub target_id: Uuid,
    pub target_name: String,
    pub kind: TagKind,
}

/// A tag joined with the target it is associated to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TargetTag {
    pub target_id: Uuid,
    #[sqlx(flatten)]
    pub tag: Tag,
}
