use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::server::response::{ApiError, ApiResponse};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state
        .store
        .register(&req.username, &req.email, &req.password)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse {
            user: user.into(),
            token,
        })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state
        .store
        .login(&req.email, &req.password)
        .map_err(|e| match e {
            Error::Unauthorized => ApiError::unauthorized("Invalid email or password"),
            e => e.into(),
        })?;

    Ok(Json(ApiResponse::success(AuthResponse {
        user: user.into(),
        token,
    })))
}

pub async fn logout(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.logout(&auth.token)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(UserResponse::from(auth.user)))
}
