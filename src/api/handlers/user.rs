use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AdminUser;
use crate::api::dtos::requests::{CreateUserRequest, RegisterRequest, UpdateUserRequest};
use crate::domain::models::user::{Role, User};
use crate::domain::services::auth_service::hash_password;
use std::sync::Arc;
use crate::error::AppError;
use tracing::{info, error};

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    RegisterRequest {
        name: payload.name.clone(),
        email: payload.email.clone(),
        password: payload.password.clone(),
    }
    .validate()?;

    let email = payload.email.trim().to_lowercase();
    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or(Role::Customer);
    let user = User::new(payload.name.trim().to_string(), email, password_hash, role);
    let created = state.user_repo.create(&user).await?;

    info!("Created {} user: {}", created.role, created.id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.user_repo.list().await?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::field("name", "Name is required."));
        }
        user.name = name.to_string();
    }

    if let Some(role) = payload.role {
        if admin.id == user.id && role != Role::Admin {
            return Err(AppError::Conflict("Cannot remove your own admin role".into()));
        }
        user.role = role;
    }

    let updated = state.user_repo.update(&user).await?;
    info!("Updated user {}", updated.id);

    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if admin.id == user_id {
        return Err(AppError::Conflict("Cannot delete yourself".into()));
    }

    let target = state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    match state.user_repo.delete(&target.id).await {
        Ok(_) => {
            info!("Deleted user {}", user_id);
            Ok(StatusCode::NO_CONTENT)
        },
        Err(e) => {
            error!("Failed to delete user {}: {:?}", user_id, e);
            Err(e)
        }
    }
}
