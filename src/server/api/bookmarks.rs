use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::BookmarkRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::types::NovelId;

pub async fn list_bookmarks(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmarks = state.store.list_bookmarks(Some(auth.user.id))?;
    Ok(Json(ApiResponse::success(bookmarks)))
}

pub async fn upsert_bookmark(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(novel_id): Path<NovelId>,
    body: Option<Json<BookmarkRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    // No body bookmarks the novel itself.
    let Json(req) = body.unwrap_or_default();
    let bookmark = state
        .store
        .upsert_bookmark(novel_id, req.chapter_id, Some(auth.user.id))?;
    Ok(Json(ApiResponse::success(bookmark)))
}

pub async fn delete_bookmark(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(novel_id): Path<NovelId>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_bookmark(novel_id, Some(auth.user.id))?;
    Ok(StatusCode::NO_CONTENT)
}
