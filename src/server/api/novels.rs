use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{MaybeUser, RequireUser};
use crate::server::AppState;
use crate::server::dto::{CreateNovelRequest, ListNovelsParams, UpdateNovelRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::{NovelId, NovelQuery};

pub async fn list_novels(
    viewer: MaybeUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListNovelsParams>,
) -> impl IntoResponse {
    let query = NovelQuery::from(params);
    Json(ApiResponse::success(state.store.list_novels(&query, viewer.id())))
}

pub async fn create_novel(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNovelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let novel = state
        .store
        .create_novel(Some(auth.user.id), req.into_new_novel()?)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(novel))))
}

pub async fn get_novel(
    viewer: MaybeUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<NovelId>,
) -> Result<impl IntoResponse, ApiError> {
    let novel = state.store.get_novel(id, viewer.id())?;
    Ok(Json(ApiResponse::success(novel)))
}

pub async fn update_novel(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<NovelId>,
    Json(req): Json<UpdateNovelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let novel = state
        .store
        .update_novel(id, Some(auth.user.id), req.into_patch()?)?;
    Ok(Json(ApiResponse::success(novel)))
}

pub async fn delete_novel(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<NovelId>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_novel(id, Some(auth.user.id))?;
    Ok(StatusCode::NO_CONTENT)
}
