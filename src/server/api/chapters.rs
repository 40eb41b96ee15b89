use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{MaybeUser, RequireUser};
use crate::server::AppState;
use crate::server::dto::{CreateChapterRequest, UpdateChapterRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::{ChapterId, NovelId};

pub async fn list_chapters(
    viewer: MaybeUser,
    State(state): State<Arc<AppState>>,
    Path(novel_id): Path<NovelId>,
) -> Result<impl IntoResponse, ApiError> {
    let chapters = state.store.list_chapters(novel_id, viewer.id())?;
    Ok(Json(ApiResponse::success(chapters)))
}

pub async fn create_chapter(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(novel_id): Path<NovelId>,
    Json(req): Json<CreateChapterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chapter = state
        .store
        .create_chapter(novel_id, Some(auth.user.id), req.into())?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(chapter))))
}

pub async fn get_chapter(
    viewer: MaybeUser,
    State(state): State<Arc<AppState>>,
    Path((novel_id, chapter_id)): Path<(NovelId, ChapterId)>,
) -> Result<impl IntoResponse, ApiError> {
    let chapter = state.store.get_chapter(novel_id, chapter_id, viewer.id())?;
    Ok(Json(ApiResponse::success(chapter)))
}

pub async fn update_chapter(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((novel_id, chapter_id)): Path<(NovelId, ChapterId)>,
    Json(req): Json<UpdateChapterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chapter = state
        .store
        .update_chapter(novel_id, chapter_id, Some(auth.user.id), req.into())?;
    Ok(Json(ApiResponse::success(chapter)))
}

pub async fn delete_chapter(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((novel_id, chapter_id)): Path<(NovelId, ChapterId)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .delete_chapter(novel_id, chapter_id, Some(auth.user.id))?;
    Ok(StatusCode::NO_CONTENT)
}
