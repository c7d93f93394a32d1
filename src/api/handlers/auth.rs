use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{LoginRequest, RegisterRequest};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::auth::{AuthResponse, UserProfile};
use crate::domain::models::user::{Role, User};
use crate::domain::services::auth_service::{hash_password, verify_password};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::info;

fn profile(user: User) -> UserProfile {
    UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(payload.name.trim().to_string(), email, password_hash, Role::Customer);
    let created = state.user_repo.create(&user).await?;

    let (access_jwt, refresh_token, csrf_token) = state.auth_service.login(&created).await?;
    set_cookies(&cookies, &access_jwt, &refresh_token);

    info!("Registered customer: {}", created.id);

    Ok((StatusCode::CREATED, Json(AuthResponse {
        csrf_token,
        user: profile(created),
    })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_email(&payload.email.trim().to_lowercase()).await?
        .ok_or(AppError::Unauthorized)?;

    verify_password(&payload.password, &user.password_hash)?;

    let (access_jwt, refresh_token, csrf_token) = state.auth_service.login(&user).await?;

    set_cookies(&cookies, &access_jwt, &refresh_token);

    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse {
        csrf_token,
        user: profile(user),
    }))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let refresh_cookie = cookies.get("refresh_token").ok_or(AppError::Unauthorized)?;
    let raw_token = refresh_cookie.value();

    let token_hash = state.auth_service.hash_token(raw_token);
    let record = state.auth_repo.find_refresh_token(&token_hash).await?
        .ok_or(AppError::Unauthorized)?;

    let user = state.user_repo.find_by_id(&record.user_id).await?
        .ok_or(AppError::Unauthorized)?;

    let (new_access, new_refresh, new_csrf) = state.auth_service.refresh(raw_token, &user).await?;

    set_cookies(&cookies, &new_access, &new_refresh);

    info!("Token refreshed for user: {}", user.id);

    Ok(Json(AuthResponse {
        csrf_token: new_csrf,
        user: profile(user),
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = cookies.get("refresh_token") {
        state.auth_service.logout(cookie.value()).await?;
    }

    cookies.remove(Cookie::build(("access_token", "")).path("/").into());
    cookies.remove(Cookie::build(("refresh_token", "")).path("/").into());

    info!("User logged out");

    Ok(StatusCode::OK)
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&session.id).await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(profile(user)))
}

fn set_cookies(cookies: &Cookies, access: &str, refresh: &str) {
    let mut access_c = Cookie::new("access_token", access.to_string());
    access_c.set_http_only(true);
    access_c.set_secure(true);
    access_c.set_same_site(SameSite::Strict);
    access_c.set_path("/");
    access_c.set_max_age(Duration::minutes(15));
    cookies.add(access_c);

    let mut refresh_c = Cookie::new("refresh_token", refresh.to_string());
    refresh_c.set_http_only(true);
    refresh_c.set_secure(true);
    refresh_c.set_same_site(SameSite::Strict);
    refresh_c.set_path("/");
    refresh_c.set_max_age(Duration::days(7));
    cookies.add(refresh_c);
}
