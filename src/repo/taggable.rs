use std::collections::{HashMap, HashSet};

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ListOpts, Morphable, Tag, TagFilter, TagKind, Taggable, TaggableFilter, TargetTag};
use crate::repo::query::{self, Conditions, Table, Value};
use crate::repo::tag::{TagRepository, TAGS};

pub const TAGGABLES: Table = Table {
    name: "taggables",
    columns: &["tag_id", "target_id", "target_name", "kind"],
    order_by: "taggables.target_id ASC",
};

/// Join between tags and any morphable target, partitioned by [`TagKind`].
#[derive(Clone, Copy, Default)]
pub struct TaggableRepository {
    tags: TagRepository,
}

impl TaggableRepository {
    pub fn new(tags: TagRepository) -> Self {
        Self { tags }
    }

    fn conditions(filter: &TaggableFilter) -> Conditions {
        Conditions::new()
            .any_of("taggables.tag_id", filter.tag_ids.iter().copied())
            .any_of("taggables.target_id", filter.target_ids())
            .eq_opt("taggables.target_name", filter.target_name.as_deref())
            .eq_opt("taggables.kind", filter.kind.map(|k| k.as_str()))
    }

    fn target_conditions(target: &impl Morphable, kind: TagKind) -> Conditions {
        Conditions::new()
            .eq("target_id", target.morph_key())
            .eq("target_name", target.morph_name())
            .eq("kind", kind.as_str())
    }

    pub async fn list(
        &self,
        conn: &mut SqliteConnection,
        filter: &TaggableFilter,
    ) -> Result<Vec<Taggable>> {
        TAGGABLES
            .list(conn, &Self::conditions(filter), ListOpts::default())
            .await
    }

    /// Tags of every matching target, keyed by target id, in one query.
    pub async fn list_tags(
        &self,
        conn: &mut SqliteConnection,
        filter: &TaggableFilter,
    ) -> Result<HashMap<Uuid, Vec<Tag>>> {
        let columns = format!("taggables.target_id, {}", TAGS.column_list());
        let from = "taggables INNER JOIN tags ON tags.id = taggables.tag_id";
        let conds = Self::conditions(filter);
        let mut qb = query::select(&columns, from, &conds, TAGS.order_by, ListOpts::default());
        let rows = qb
            .build_query_as::<TargetTag>()
            .fetch_all(&mut *conn)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            let tags = grouped.entry(row.target_id).or_default();
            // Same tag under both kinds when no kind is filtered
            if !tags.iter().any(|t| t.id == row.tag.id) {
                tags.push(row.tag);
            }
        }
        Ok(grouped)
    }

    /// Associates `tag_ids` with `target` under `kind`.
    pub async fn assoc(
        &self,
        conn: &mut SqliteConnection,
        target: &impl Morphable,
        kind: TagKind,
        tag_ids: &[Uuid],
    ) -> Result<u64> {
        let mut affected = 0;
        for tag_id in tag_ids {
            let values: Vec<(&str, Value)> = vec![
                ("tag_id", (*tag_id).into()),
                ("target_id", target.morph_key().into()),
                ("target_name", target.morph_name().into()),
                ("kind", kind.as_str().into()),
            ];
            affected += TAGGABLES.insert(conn, &values).await?;
        }
        Ok(affected)
    }

    /// Removes the `tag_ids` associations of `target` under `kind`.
    pub async fn dissoc(
        &self,
        conn: &mut SqliteConnection,
        target: &impl Morphable,
        kind: TagKind,
        tag_ids: &[Uuid],
    ) -> Result<u64> {
        // An empty IN-set means "no filter" and would clear the whole kind.
        if tag_ids.is_empty() {
            return Ok(0);
        }
        let conds = Self::target_conditions(target, kind).any_of("tag_id", tag_ids.iter().copied());
        TAGGABLES.delete(conn, &conds).await
    }

    /// Makes the `kind` associations of `target` exactly `tags`.
    ///
    /// Only the difference is written: new tags are inserted, dropped tags
    /// deleted, and rows for tags in both sets are left alone. The first
    /// failure is returned as-is; run inside a transaction for atomicity.
    pub async fn re_assoc_tags(
        &self,
        conn: &mut SqliteConnection,
        target: &impl Morphable,
        kind: TagKind,
        tags: &[Tag],
    ) -> Result<()> {
        let existing: HashSet<Uuid> = self
            .list(conn, &TaggableFilter::for_target(target, Some(kind)))
            .await?
            .into_iter()
            .map(|t| t.tag_id)
            .collect();

        let mut desired = HashSet::new();
        let mut added = Vec::new();
        for tag in tags {
            if desired.insert(tag.id) && !existing.contains(&tag.id) {
                added.push(tag.id);
            }
        }
        let removed: Vec<Uuid> = existing.difference(&desired).copied().collect();

        self.assoc(conn, target, kind, &added).await?;
        self.dissoc(conn, target, kind, &removed).await?;

        tracing::debug!(
            target_id = %target.morph_key(),
            target_name = target.morph_name(),
            %kind,
            added = added.len(),
            removed = removed.len(),
            "re-associated tags"
        );
        Ok(())
    }

    /// Resolves `names` among `user_id`'s tags and re-associates the ones
    /// that exist. Unknown names are skipped. Returns the resolved tags.
    pub async fn re_assoc_tag_names(
        &self,
        conn: &mut SqliteConnection,
        target: &impl Morphable,
        kind: TagKind,
        user_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Tag>> {
        let tags = if names.is_empty() {
            Vec::new()
        } else {
            let filter = TagFilter {
                user_id: Some(user_id),
                names: names.to_vec(),
                ..Default::default()
            };
            self.tags.list(conn, &filter).await?
        };

        self.re_assoc_tags(conn, target, kind, &tags).await?;
        Ok(tags)
    }

    /// Drops every `kind` association of `target`. Clearing an empty set is
    /// not an error.
    pub async fn clear_by_kind(
        &self,
        conn: &mut SqliteConnection,
        target: &impl Morphable,
        kind: TagKind,
    ) -> Result<u64> {
        TAGGABLES
            .delete(conn, &Self::target_conditions(target, kind))
            .await
    }

    /// Drops every association of a tag, whatever the target or kind.
    pub async fn clear_by_tag(&self, conn: &mut SqliteConnection, tag_id: Uuid) -> Result<u64> {
        TAGGABLES
            .delete(conn, &Conditions::new().eq("tag_id", tag_id))
            .await
    }
}
