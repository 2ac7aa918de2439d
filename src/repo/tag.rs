use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ListOpts, Tag, TagFilter};
use crate::repo::query::{Conditions, Table, Value};

pub const TAGS: Table = Table {
    name: "tags",
    columns: &[
        "id",
        "name",
        "user_id",
        "parent_id",
        "level",
        "color",
        "bg_color",
        "has_children",
        "created_at",
        "updated_at",
    ],
    order_by: "tags.name ASC, tags.level ASC",
};

/// Raw tag persistence. Writes that must keep the hierarchy consistent go
/// through [`TagHierarchy`](crate::repo::tag_tree::TagHierarchy).
#[derive(Clone, Copy, Default)]
pub struct TagRepository;

impl TagRepository {
    pub fn new() -> Self {
        Self
    }

    fn conditions(filter: &TagFilter) -> Conditions {
        let conds = Conditions::new()
            .any_of("tags.id", filter.ids.iter().copied())
            .any_of("tags.user_id", filter.user_ids())
            .any_of("tags.name", filter.names())
            .like("tags.name", filter.name_pattern.as_deref())
            .any_of("tags.parent_id", filter.parent_ids.iter().copied())
            .eq_opt("tags.level", filter.level);

        if filter.root_only {
            conds.is_null("tags.parent_id")
        } else {
            conds
        }
    }

    fn values(tag: &Tag) -> Vec<(&'static str, Value)> {
        vec![
            ("name", tag.name.clone().into()),
            ("user_id", tag.user_id.into()),
            ("parent_id", tag.parent_id.into()),
            ("level", tag.level.into()),
            ("color", tag.color.clone().into()),
            ("bg_color", tag.bg_color.clone().into()),
            ("has_children", tag.has_children.into()),
            ("updated_at", tag.updated_at.into()),
        ]
    }

    pub async fn list(&self, conn: &mut SqliteConnection, filter: &TagFilter) -> Result<Vec<Tag>> {
        TAGS.list(conn, &Self::conditions(filter), filter.list).await
    }

    pub async fn count(&self, conn: &mut SqliteConnection, filter: &TagFilter) -> Result<i64> {
        TAGS.count(conn, &Self::conditions(filter)).await
    }

    pub async fn find(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Tag>> {
        TAGS.find(conn, id).await
    }

    pub async fn get(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Tag> {
        self.find(conn, id).await?.ok_or(AppError::NotFound)
    }

    /// Lookup by the `(user_id, name)` natural key.
    pub async fn find_name(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Tag>> {
        let filter = TagFilter {
            list: ListOpts::new(1, 1),
            user_id: Some(user_id),
            name: Some(name.to_string()),
            ..Default::default()
        };
        Ok(self.list(conn, &filter).await?.into_iter().next())
    }

    /// Number of tags whose parent is `id`.
    pub async fn count_children(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<i64> {
        let filter = TagFilter {
            parent_ids: vec![id],
            ..Default::default()
        };
        self.count(conn, &filter).await
    }

    /// Inserts `tag` with a fresh id and timestamps. `tag` is only
    /// overwritten once the insert succeeds.
    pub async fn create(&self, conn: &mut SqliteConnection, tag: &mut Tag) -> Result<()> {
        let mut tag2 = tag.clone();
        tag2.id = Uuid::new_v4();
        tag2.created_at = Utc::now();
        tag2.updated_at = tag2.created_at;

        let mut values: Vec<(&str, Value)> =
            vec![("id", tag2.id.into()), ("created_at", tag2.created_at.into())];
        values.extend(Self::values(&tag2));
        TAGS.insert(conn, &values).await?;

        *tag = tag2;
        Ok(())
    }

    /// Replaces the stored row with `tag`, refreshing `updated_at`.
    pub async fn update(&self, conn: &mut SqliteConnection, tag: &mut Tag) -> Result<()> {
        let mut tag2 = tag.clone();
        tag2.updated_at = Utc::now();

        let affected = TAGS.update(conn, tag2.id, &Self::values(&tag2)).await?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }

        *tag = tag2;
        Ok(())
    }

    pub async fn delete(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<u64> {
        TAGS.delete(conn, &Conditions::new().eq("id", id)).await
    }
}
