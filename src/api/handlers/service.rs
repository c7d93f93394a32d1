use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{ItemPayload, ServicePayload};
use crate::api::dtos::responses::RequestFormResponse;
use crate::api::extractors::auth::{AdminUser, AuthUser};
use crate::domain::models::service::Service;
use crate::domain::services::wizard::ServiceRequestWizard;

/// Loads a service as customers see it today.
pub(crate) async fn load_public_service(state: &AppState, id: i64) -> Result<Service, AppError> {
    let today = Utc::now().date_naive();
    state.service_repo.find_by_id(id).await?
        .map(|s| s.with_offer_policy(today))
        .ok_or(AppError::NotFound("Service not found".into()))
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let services: Vec<Service> = state.service_repo.list().await?
        .into_iter()
        .map(|s| s.with_offer_policy(today))
        .collect();

    Ok(Json(services))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_public_service(&state, id).await?))
}

pub async fn request_form(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let service = load_public_service(&state, id).await?;
    let wizard = ServiceRequestWizard::mount(service, &user);

    Ok(Json(RequestFormResponse::from(&wizard)))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<ServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let service = Service::new(payload.into_params());
    let created = state.service_repo.create(&service).await?;

    info!("Admin {} created service {}", admin.id, created.id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let existing = state.service_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;

    let params = payload.into_params();
    let service = Service {
        name: params.name,
        description: params.description,
        base_price: params.base_price,
        is_special_offer: params.is_special_offer,
        special_price: params.special_price,
        offer_end_date: params.offer_end_date,
        duration: params.duration,
        ..existing
    };

    let updated = state.service_repo.update(&service).await?;
    info!("Admin {} updated service {}", admin.id, updated.id);

    Ok(Json(updated))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.service_repo.delete(id).await?;
    info!("Admin {} deleted service {}", admin.id, id);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(service_id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if state.service_repo.find_by_id(service_id).await?.is_none() {
        return Err(AppError::NotFound("Service not found".into()));
    }

    let created = state.service_repo.create_item(&payload.into_item(service_id)).await?;
    info!("Added item {} to service {}", created.id, service_id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(item_id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let existing = state.service_repo.find_item(item_id).await?
        .ok_or(AppError::NotFound("Item not found".into()))?;

    let mut item = payload.into_item(existing.service_id);
    item.id = existing.id;

    Ok(Json(state.service_repo.update_item(&item).await?))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.service_repo.delete_item(item_id).await?;
    info!("Deleted item {}", item_id);

    Ok(StatusCode::NO_CONTENT)
}
