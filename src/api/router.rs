use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{auth, dashboard, health, service, service_request, user};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))

        // Catalog
        .route("/api/v1/services", get(service::list_services))
        .route("/api/v1/services/{id}", get(service::get_service))
        .route("/api/v1/services/{id}/request-form", get(service::request_form))

        // Customer Service Requests
        .route("/api/v1/service-requests", post(service_request::submit).get(service_request::list_mine))
        .route("/api/v1/service-requests/{id}", get(service_request::get_mine))
        .route("/api/v1/service-requests/{id}/cancel", post(service_request::cancel_mine))

        // Admin Catalog
        .route("/api/v1/admin/services", post(service::create_service))
        .route("/api/v1/admin/services/{id}", put(service::update_service).delete(service::delete_service))
        .route("/api/v1/admin/services/{id}/items", post(service::create_item))
        .route("/api/v1/admin/items/{item_id}", put(service::update_item).delete(service::delete_item))

        // Admin Service Requests
        .route("/api/v1/admin/service-requests", get(service_request::admin_list))
        .route("/api/v1/admin/service-requests/{id}", get(service_request::admin_get).delete(service_request::admin_delete))
        .route("/api/v1/admin/service-requests/{id}/status", put(service_request::admin_update_status))

        // Admin Users
        .route("/api/v1/admin/users", get(user::list_users).post(user::create_user))
        .route("/api/v1/admin/users/{user_id}", put(user::update_user).delete(user::delete_user))

        .route("/admin/dashboard", get(dashboard::dashboard))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
