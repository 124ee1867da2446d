//! User administration routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use pressroom_db::UserRole;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAdmin;
use super::types::{UpdateUserRequest, UserResponse};

/// GET /api/v1/admin/users
async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.auth.store().list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/v1/admin/users/{id}
async fn get_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .auth
        .store()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/v1/admin/users/{id}
async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Updating user: {}", id);

    let role = request
        .role
        .as_deref()
        .map(|r| {
            r.parse::<UserRole>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", r)))
        })
        .transpose()?;

    // Admins cannot lock themselves out
    if id == admin.id && (role.is_some_and(|r| r != admin.role) || request.active == Some(false)) {
        return Err(ApiError::BadRequest(
            "Cannot change your own role or deactivate your own account".to_string(),
        ));
    }

    let store = state.auth.store();
    let mut user = store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    if let Some(role) = role {
        user.role = role;
    }
    if let Some(active) = request.active {
        user.active = active;
    }

    let user = store.save(&user).await?;

    info!(
        "User {} updated by {}: role={}, active={}",
        user.username, admin.username, user.role, user.active
    );

    Ok(Json(UserResponse::from(user)))
}

/// Create user administration routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/users", get(list_users))
        .route("/api/v1/admin/users/{id}", get(get_user).put(update_user))
}
