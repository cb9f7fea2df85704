//! Axum route handlers for the Users API.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::user::{NewUser, User, UserDraft};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// GET /api/users
pub async fn handle_list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = state.users.list_users().await?;
    Ok(Json(UserListResponse { users }))
}

/// POST /api/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(new_user) = payload?;
    let draft = UserDraft::try_from(new_user)?;
    let user = state.users.create_user(draft).await?;
    tracing::info!("Created user {} ({})", user.id, user.tier);
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}
