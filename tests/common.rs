use service_booking::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::{build_state, seed_admin},
    infra::repositories::{
        sqlite_auth_repo::SqliteAuthRepo,
        sqlite_service_repo::SqliteServiceRepo,
        sqlite_service_request_repo::SqliteServiceRequestRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@test.local";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub fn test_config(db_url: &str) -> Config {
    Config {
        database_url: db_url.to_string(),
        port: 0,
        jwt_secret_key: include_str!("../tests/keys/test_private.pem").to_string(),
        jwt_public_key: include_str!("../tests/keys/test_public.pem").to_string(),
        auth_issuer: "test-issuer".to_string(),
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        admin_name: "Test Admin".to_string(),
        offer_sweep_interval: Duration::from_secs(3600),
        submission_timeout: Duration::from_secs(5),
    }
}

fn auth_from_cookies(response: &Response) -> String {
    let cookies: Vec<String> = response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|h| h.to_str().unwrap().to_string())
        .collect();

    let access_token_cookie = cookies.iter()
        .find(|c| c.contains("access_token="))
        .expect("No access_token cookie returned");

    let start = access_token_cookie.find("access_token=").unwrap() + 13;
    let end = access_token_cookie[start..].find(';').unwrap_or(access_token_cookie.len() - start);
    access_token_cookie[start..start + end].to_string()
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = test_config(&db_url);

        let state = build_state(
            &config,
            Arc::new(SqliteUserRepo::new(pool.clone())),
            Arc::new(SqliteAuthRepo::new(pool.clone())),
            Arc::new(SqliteServiceRepo::new(pool.clone())),
            Arc::new(SqliteServiceRequestRepo::new(pool.clone())),
        )
        .expect("Failed to build test state");

        seed_admin(&state).await.expect("Failed to seed admin");

        let state = Arc::new(state);
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Sends a JSON request, attaching the session cookie and CSRF header
    /// when `auth` is given.
    pub async fn request(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthHeaders {
        let response = self.request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ).await;

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let access_token = auth_from_cookies(&response);
        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    pub async fn login_admin(&self) -> AuthHeaders {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn register(&self, name: &str, email: &str) -> AuthHeaders {
        let response = self.request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": "customer-password" })),
        ).await;

        if !response.status().is_success() {
            panic!("Registration failed in test helper: status {}", response.status());
        }

        let access_token = auth_from_cookies(&response);
        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    /// Creates a service through the admin API and returns its id.
    pub async fn create_service(&self, admin: &AuthHeaders, payload: Value) -> i64 {
        let response = self.request("POST", "/api/v1/admin/services", Some(admin), Some(payload)).await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        parse_body(response).await["id"].as_i64().unwrap()
    }

    /// Adds an item to a service and returns the item id.
    pub async fn create_item(&self, admin: &AuthHeaders, service_id: i64, name: &str, price: f64) -> i64 {
        let response = self.request(
            "POST",
            &format!("/api/v1/admin/services/{}/items", service_id),
            Some(admin),
            Some(json!({ "name": name, "price": price, "duration": "30m" })),
        ).await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        parse_body(response).await["id"].as_i64().unwrap()
    }
}

/// A complete draft for `service_id` scheduled `days_ahead` days from today.
#[allow(dead_code)]
pub fn valid_draft(service_id: i64, items: &[i64], days_ahead: i64) -> Value {
    let date = (chrono::Utc::now().date_naive() + chrono::Duration::days(days_ahead))
        .format("%Y-%m-%d")
        .to_string();

    json!({
        "service_id": service_id,
        "selected_additional_items": items,
        "description": "Two bedrooms, one bath",
        "client_name": "Jane Doe",
        "client_email": "jane@example.com",
        "client_phone": "+1 555 0100",
        "client_address": "Main Street",
        "house_number": "12",
        "city": "Springfield",
        "state": "IL",
        "postal_code": "62701",
        "country": "USA",
        "preferred_date": date,
        "preferred_time": "09:30",
        "special_requirements": "",
        "additional_notes": "Ring twice"
    })
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
