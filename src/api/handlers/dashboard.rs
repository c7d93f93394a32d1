use axum::{extract::State, response::{Html, IntoResponse}};
use std::collections::HashMap;
use std::sync::Arc;
use tera::Context;
use tracing::error;

use crate::state::AppState;
use crate::error::AppError;
use crate::api::extractors::auth::AdminUser;
use crate::api::dtos::responses::{DashboardRow, StatusSummary};
use crate::domain::models::service_request::RequestStatus;
use crate::infra::factory::DASHBOARD_TEMPLATE;

const RECENT_LIMIT: i64 = 10;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let counts: HashMap<RequestStatus, i64> = state.request_repo.count_by_status().await?
        .into_iter()
        .collect();

    let summaries: Vec<StatusSummary> = RequestStatus::ALL
        .into_iter()
        .map(|status| StatusSummary::new(status, counts.get(&status).copied().unwrap_or(0)))
        .collect();
    let total: i64 = counts.values().sum();

    let service_names: HashMap<i64, String> = state.service_repo.list().await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let recent: Vec<DashboardRow> = state.request_repo.recent(RECENT_LIMIT).await?
        .into_iter()
        .map(|r| DashboardRow {
            id: r.id,
            service_name: service_names.get(&r.service_id).cloned().unwrap_or_else(|| format!("#{}", r.service_id)),
            client_name: r.client_name,
            preferred_date: r.preferred_date.to_string(),
            preferred_time: r.preferred_time.format("%H:%M").to_string(),
            estimated_price: format!("{:.2}", r.estimated_price),
            status: StatusSummary::new(r.status, 0),
        })
        .collect();

    let mut context = Context::new();
    context.insert("admin_name", &admin.name);
    context.insert("statuses", &summaries);
    context.insert("total", &total);
    context.insert("recent", &recent);

    let html = state.templates.render(DASHBOARD_TEMPLATE, &context).map_err(|e| {
        error!("Dashboard render failed: {:?}", e);
        AppError::InternalWithMsg(format!("Template error: {}", e))
    })?;

    Ok(Html(html))
}
