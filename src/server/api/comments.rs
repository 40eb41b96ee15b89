use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{MaybeUser, RequireUser};
use crate::server::AppState;
use crate::server::dto::{CreateCommentRequest, ListCommentsParams};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::{CommentId, NovelId};

pub async fn list_comments(
    viewer: MaybeUser,
    State(state): State<Arc<AppState>>,
    Path(novel_id): Path<NovelId>,
    Query(params): Query<ListCommentsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .store
        .list_comments(novel_id, params.chapter_id, viewer.id())?;
    Ok(Json(ApiResponse::success(comments)))
}

pub async fn create_comment(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(novel_id): Path<NovelId>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.store.create_comment(
        novel_id,
        req.chapter_id,
        Some(auth.user.id),
        &req.body,
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

pub async fn delete_comment(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((novel_id, comment_id)): Path<(NovelId, CommentId)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .delete_comment(novel_id, comment_id, Some(auth.user.id))?;
    Ok(StatusCode::NO_CONTENT)
}
