use axum::{extract::{State, Path, Query}, response::IntoResponse, Json, http::StatusCode};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{StatusFilter, UpdateStatusRequest};
use crate::api::extractors::auth::{AdminUser, AuthUser};
use crate::domain::models::service_request::{
    NewServiceRequestParams, RequestStatus, ServiceRequest, ServiceRequestForm,
};
use crate::domain::services::{pricing::calculate_total_price, validation::validate_submission};

pub async fn submit(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(form): Json<ServiceRequestForm>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();

    let service = state.service_repo.find_by_id(form.service_id).await?
        .map(|s| s.with_offer_policy(today))
        .ok_or_else(|| AppError::field("service_id", "The selected service does not exist."))?;

    let schedule = validate_submission(&form, &service, today).map_err(|errors| {
        warn!("Rejected service request for service {}: {:?}", service.id, errors.keys().collect::<Vec<_>>());
        AppError::FieldValidation(errors)
    })?;

    let selected: BTreeSet<i64> = form.selected_additional_items.iter().copied().collect();
    let estimated_price = calculate_total_price(&service, &selected);

    let request = ServiceRequest::new(NewServiceRequestParams {
        user_id: user.id.clone(),
        form,
        preferred_date: schedule.date,
        preferred_time: schedule.time,
        estimated_price,
    });

    let created = state.request_repo.create(&request).await?;
    info!("Service request {} created by {} (estimate {:.2})", created.id, user.id, created.estimated_price);

    Ok((StatusCode::CREATED, Json(created)))
}

async fn find_owned(state: &AppState, id: i64, user_id: &str) -> Result<ServiceRequest, AppError> {
    state.request_repo.find_by_id(id).await?
        .filter(|r| r.user_id == user_id)
        .ok_or(AppError::NotFound("Service request not found".into()))
}

pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.request_repo.list_by_user(&user.id).await?))
}

pub async fn get_mine(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_owned(&state, id, &user.id).await?))
}

pub async fn cancel_mine(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let request = find_owned(&state, id, &user.id).await?;

    if request.status != RequestStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Only pending requests can be cancelled (current status: {})",
            request.status
        )));
    }

    let updated = state.request_repo
        .update_status(id, RequestStatus::Pending, RequestStatus::Cancelled)
        .await?;
    info!("Service request {} cancelled by its owner", id);

    Ok(Json(updated))
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(filter): Query<StatusFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.request_repo.list(filter.status).await?))
}

pub async fn admin_get(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let request = state.request_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Service request not found".into()))?;

    Ok(Json(request))
}

pub async fn admin_update_status(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = state.request_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Service request not found".into()))?;

    if !request.status.can_transition_to(payload.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move a request from {} to {}",
            request.status, payload.status
        )));
    }

    let updated = state.request_repo.update_status(id, request.status, payload.status).await?;
    info!("Admin {} moved request {} from {} to {}", admin.id, id, request.status, updated.status);

    Ok(Json(updated))
}

pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.request_repo.delete(id).await?;
    info!("Admin {} deleted request {}", admin.id, id);

    Ok(StatusCode::NO_CONTENT)
}
