use std::collections::HashSet;

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Tag, TagFilter};
use crate::repo::tag::TagRepository;

/// Keeps `level` and `has_children` consistent across tag writes.
///
/// Every check runs before the first write, so a rejected call leaves the
/// hierarchy as it was. Atomicity of the multi-row writes is up to the
/// caller's transaction.
#[derive(Clone, Copy, Default)]
pub struct TagHierarchy {
    tags: TagRepository,
}

impl TagHierarchy {
    pub fn new(tags: TagRepository) -> Self {
        Self { tags }
    }

    async fn resolve_parent(&self, conn: &mut SqliteConnection, tag: &Tag) -> Result<Option<Tag>> {
        let Some(parent_id) = tag.parent_id else {
            return Ok(None);
        };

        let parent = self.tags.find(conn, parent_id).await?.ok_or_else(|| {
            AppError::Validation(format!("Parent tag {} does not exist", parent_id))
        })?;

        if parent.user_id != tag.user_id {
            return Err(AppError::Validation(
                "Parent tag belongs to another user".to_string(),
            ));
        }

        Ok(Some(parent))
    }

    /// Walks up from `parent` and fails if `tag_id` is one of its ancestors
    /// (or `parent` itself).
    async fn check_cycle(&self, conn: &mut SqliteConnection, tag_id: Uuid, parent: &Tag) -> Result<()> {
        let mut seen = HashSet::new();
        let mut current = Some(parent.clone());

        while let Some(tag) = current {
            if tag.id == tag_id {
                return Err(AppError::Validation(
                    "A tag cannot become its own ancestor".to_string(),
                ));
            }
            // Stored data already loops; nothing above this point can be `tag_id`.
            if !seen.insert(tag.id) {
                break;
            }
            current = match tag.parent_id {
                Some(id) => self.tags.find(conn, id).await?,
                None => None,
            };
        }

        Ok(())
    }

    /// Sets `has_children` on `id` from the actual child count.
    async fn refresh_has_children(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<()> {
        let Some(mut tag) = self.tags.find(conn, id).await? else {
            return Ok(());
        };

        let has_children = self.tags.count_children(conn, id).await? > 0;
        if tag.has_children != has_children {
            tag.has_children = has_children;
            self.tags.update(conn, &mut tag).await?;
        }
        Ok(())
    }

    async fn mark_has_children(&self, conn: &mut SqliteConnection, mut parent: Tag) -> Result<()> {
        if !parent.has_children {
            parent.has_children = true;
            self.tags.update(conn, &mut parent).await?;
        }
        Ok(())
    }

    /// Re-derives the level of every descendant of `root`.
    async fn relevel_descendants(&self, conn: &mut SqliteConnection, root: &Tag) -> Result<()> {
        let mut pending = vec![(root.id, root.level)];

        while let Some((parent_id, parent_level)) = pending.pop() {
            let filter = TagFilter {
                parent_ids: vec![parent_id],
                ..Default::default()
            };
            for mut child in self.tags.list(conn, &filter).await? {
                let level = parent_level + 1;
                if child.level != level {
                    child.level = level;
                    self.tags.update(conn, &mut child).await?;
                    pending.push((child.id, level));
                }
            }
        }

        Ok(())
    }

    pub async fn create(&self, conn: &mut SqliteConnection, tag: &mut Tag) -> Result<()> {
        let parent = self.resolve_parent(conn, tag).await?;

        let mut tag2 = tag.clone();
        tag2.level = parent.as_ref().map_or(0, |p| p.level + 1);
        tag2.has_children = false;
        self.tags.create(conn, &mut tag2).await?;

        if let Some(parent) = parent {
            self.mark_has_children(conn, parent).await?;
        }

        *tag = tag2;
        Ok(())
    }

    /// Returns the tag named `candidate.name` for `candidate.user_id`,
    /// creating it when missing. A concurrent create of the same name
    /// surfaces as a unique-constraint error.
    pub async fn find_or_create(&self, conn: &mut SqliteConnection, candidate: &Tag) -> Result<Tag> {
        if let Some(found) = self
            .tags
            .find_name(conn, candidate.user_id, &candidate.name)
            .await?
        {
            return Ok(found);
        }

        let mut tag = candidate.clone();
        self.create(conn, &mut tag).await?;
        Ok(tag)
    }

    /// Full replace of a stored tag. `level` and `has_children` are derived,
    /// whatever the caller supplied.
    pub async fn update(&self, conn: &mut SqliteConnection, tag: &mut Tag) -> Result<()> {
        let stored = self.tags.get(conn, tag.id).await?;
        if stored.user_id != tag.user_id {
            return Err(AppError::Validation(
                "Tag owner cannot be changed".to_string(),
            ));
        }

        let parent = self.resolve_parent(conn, tag).await?;
        if let Some(parent) = &parent {
            self.check_cycle(conn, tag.id, parent).await?;
        }

        let mut tag2 = tag.clone();
        tag2.level = parent.as_ref().map_or(0, |p| p.level + 1);
        tag2.has_children = stored.has_children;
        self.tags.update(conn, &mut tag2).await?;

        if tag2.level != stored.level {
            self.relevel_descendants(conn, &tag2).await?;
        }

        if stored.parent_id != tag2.parent_id {
            if let Some(old_parent_id) = stored.parent_id {
                self.refresh_has_children(conn, old_parent_id).await?;
            }
            if let Some(parent) = parent {
                self.mark_has_children(conn, parent).await?;
            }
        }

        *tag = tag2;
        Ok(())
    }

    /// Deletes a leaf tag and returns the affected-row count (0 when absent).
    /// Associations pointing at the tag are left for the caller to clear.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<u64> {
        let Some(tag) = self.tags.find(conn, id).await? else {
            return Ok(0);
        };

        if self.tags.count_children(conn, id).await? > 0 {
            return Err(AppError::Validation(format!(
                "Tag {} still has child tags",
                tag.name
            )));
        }

        let affected = self.tags.delete(conn, id).await?;
        if let Some(parent_id) = tag.parent_id {
            self.refresh_has_children(conn, parent_id).await?;
        }

        Ok(affected)
    }
}
