use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    ListOpts, Share, ShareDetail, ShareFilter, ShareInput, ShareResponse, ShareStatus, TagKind,
    TaggableFilter,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<ShareStatus>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

fn validate(input: &ShareInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Share name is required".to_string()));
    }
    if input.slug.trim().is_empty() {
        return Err(AppError::Validation("Share slug is required".to_string()));
    }
    Ok(())
}

fn fill(share: &mut Share, input: &ShareInput) {
    share.slug = input.slug.trim().to_string();
    share.name = input.name.trim().to_string();
    share.description = input.description.clone();
    if let Some(status) = input.status {
        share.status = status;
    }
}

/// Re-associates both tag kinds from the input and builds the response.
async fn save_tags(
    state: &AppState,
    conn: &mut SqliteConnection,
    share: Share,
    input: &ShareInput,
) -> Result<ShareDetail> {
    let must_tags = state
        .taggables
        .re_assoc_tag_names(conn, &share, TagKind::MustTag, share.user_id, &input.must_tags)
        .await?;
    let any_tags = state
        .taggables
        .re_assoc_tag_names(conn, &share, TagKind::AnyTag, share.user_id, &input.any_tags)
        .await?;

    Ok(share.into_detail(
        must_tags.into_iter().map(Into::into).collect(),
        any_tags.into_iter().map(Into::into).collect(),
    ))
}

pub async fn list_shares(
    State(state): State<AppState>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<Vec<ShareResponse>>> {
    let filter = ShareFilter {
        list: ListOpts::new(query.page.unwrap_or(0), query.size.unwrap_or(0)),
        user_id: query.user_id,
        status: query.status,
        ..Default::default()
    };
    let mut conn = state.pool.acquire().await?;

    let shares = state.shares.list(&mut conn, &filter).await?;
    Ok(Json(shares.into_iter().map(Into::into).collect()))
}

pub async fn get_share(
    State(state): State<AppState>,
    Path(share_id): Path<Uuid>,
) -> Result<Json<ShareDetail>> {
    let mut conn = state.pool.acquire().await?;
    let share = state.shares.get(&mut conn, share_id).await?;

    let mut must = state
        .taggables
        .list_tags(&mut conn, &TaggableFilter::for_target(&share, Some(TagKind::MustTag)))
        .await?;
    let mut any = state
        .taggables
        .list_tags(&mut conn, &TaggableFilter::for_target(&share, Some(TagKind::AnyTag)))
        .await?;

    let must_tags = must.remove(&share.id).unwrap_or_default();
    let any_tags = any.remove(&share.id).unwrap_or_default();

    Ok(Json(share.into_detail(
        must_tags.into_iter().map(Into::into).collect(),
        any_tags.into_iter().map(Into::into).collect(),
    )))
}

pub async fn create_share(
    State(state): State<AppState>,
    Json(input): Json<ShareInput>,
) -> Result<Json<ShareDetail>> {
    validate(&input)?;

    let mut share = Share::new(input.user_id, "", "");
    fill(&mut share, &input);

    let mut tx = state.begin().await?;
    state.shares.create(&mut tx, &mut share).await?;
    let detail = save_tags(&state, &mut tx, share, &input).await?;
    tx.commit().await?;

    Ok(Json(detail))
}

pub async fn update_share(
    State(state): State<AppState>,
    Path(share_id): Path<Uuid>,
    Json(input): Json<ShareInput>,
) -> Result<Json<ShareDetail>> {
    validate(&input)?;

    let mut tx = state.begin().await?;
    let mut share = state.shares.get(&mut tx, share_id).await?;
    if share.user_id != input.user_id {
        return Err(AppError::BadRequest(
            "Share owner cannot be changed".to_string(),
        ));
    }
    fill(&mut share, &input);

    state.shares.update(&mut tx, &mut share).await?;
    let detail = save_tags(&state, &mut tx, share, &input).await?;
    tx.commit().await?;

    Ok(Json(detail))
}

/// Deletes the share, then its tag associations and images, in one transaction.
pub async fn delete_share(
    State(state): State<AppState>,
    Path(share_id): Path<Uuid>,
) -> Result<()> {
    let mut tx = state.begin().await?;
    let share = state.shares.get(&mut tx, share_id).await?;

    state.shares.delete(&mut tx, share.id).await?;
    state
        .taggables
        .clear_by_kind(&mut tx, &share, TagKind::MustTag)
        .await?;
    state
        .taggables
        .clear_by_kind(&mut tx, &share, TagKind::AnyTag)
        .await?;
    state.images.delete_for(&mut tx, &share).await?;
    tx.commit().await?;

    Ok(())
}
