use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CreateTag, ListOpts, Tag, TagFilter, TagResponse, UpdateTag};
use crate::repo::query::escape_like;
use crate::state::AppState;

const DEFAULT_COLOR: &str = "#6c757d";

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    pub user_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub root: bool,
    pub level: Option<i64>,
    /// Substring of the tag name, matched literally.
    pub q: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl From<TagQuery> for TagFilter {
    fn from(query: TagQuery) -> Self {
        TagFilter {
            list: ListOpts::new(query.page.unwrap_or(0), query.size.unwrap_or(0)),
            user_id: query.user_id,
            parent_ids: query.parent_id.into_iter().collect(),
            root_only: query.root,
            level: query.level,
            name_pattern: query.q.map(|q| format!("%{}%", escape_like(&q))),
            ..Default::default()
        }
    }
}

pub async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> Result<Json<Vec<TagResponse>>> {
    let filter = TagFilter::from(query);
    let mut conn = state.pool.acquire().await?;

    let tags = state.tags.list(&mut conn, &filter).await?;
    Ok(Json(tags.into_iter().map(|t| t.into()).collect()))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<CreateTag>,
) -> Result<Json<TagResponse>> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Tag name is required".to_string()));
    }

    let mut tag = Tag::new(input.user_id, input.name.trim());
    tag.parent_id = input.parent_id;
    tag.color = input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
    tag.bg_color = input.bg_color.unwrap_or_default();

    let mut tx = state.begin().await?;
    state.tag_tree.create(&mut tx, &mut tag).await?;
    tx.commit().await?;

    Ok(Json(tag.into()))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
    Json(input): Json<UpdateTag>,
) -> Result<Json<TagResponse>> {
    let mut tx = state.begin().await?;
    let mut tag = state.tags.get(&mut tx, tag_id).await?;

    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Tag name is required".to_string()));
        }
        tag.name = name.trim().to_string();
    }
    if input.detach {
        tag.parent_id = None;
    } else if input.parent_id.is_some() {
        tag.parent_id = input.parent_id;
    }
    if let Some(color) = input.color {
        tag.color = color;
    }
    if let Some(bg_color) = input.bg_color {
        tag.bg_color = bg_color;
    }

    state.tag_tree.update(&mut tx, &mut tag).await?;
    tx.commit().await?;

    Ok(Json(tag.into()))
}

pub async fn delete_tag(State(state): State<AppState>, Path(tag_id): Path<Uuid>) -> Result<()> {
    let mut tx = state.begin().await?;

    if state.tag_tree.delete(&mut tx, tag_id).await? == 0 {
        return Err(AppError::NotFound);
    }
    let cleared = state.taggables.clear_by_tag(&mut tx, tag_id).await?;
    tx.commit().await?;

    tracing::debug!(%tag_id, cleared, "deleted tag");
    Ok(())
}
