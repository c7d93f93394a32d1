use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::models::user::{Role, User};
use crate::domain::ports::{AuthRepository, ServiceRepository, ServiceRequestRepository, UserRepository};
use crate::domain::services::auth_service::{hash_password, AuthService};
use crate::error::AppError;
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_service_repo::PostgresServiceRepo,
    postgres_service_request_repo::PostgresServiceRequestRepo, postgres_user_repo::PostgresUserRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_service_repo::SqliteServiceRepo,
    sqlite_service_request_repo::SqliteServiceRequestRepo, sqlite_user_repo::SqliteUserRepo,
};

pub const DASHBOARD_TEMPLATE: &str = "dashboard.html";

pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template(DASHBOARD_TEMPLATE, include_str!("../../templates/dashboard.html"))
        .expect("Failed to load dashboard template");
    tera
}

struct Repositories {
    user_repo: Arc<dyn UserRepository>,
    auth_repo: Arc<dyn AuthRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    request_repo: Arc<dyn ServiceRequestRepository>,
}

impl Repositories {
    fn postgres(pool: PgPool) -> Self {
        Self {
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth_repo: Arc::new(PostgresAuthRepo::new(pool.clone())),
            service_repo: Arc::new(PostgresServiceRepo::new(pool.clone())),
            request_repo: Arc::new(PostgresServiceRequestRepo::new(pool)),
        }
    }

    fn sqlite(pool: SqlitePool) -> Self {
        Self {
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth_repo: Arc::new(SqliteAuthRepo::new(pool.clone())),
            service_repo: Arc::new(SqliteServiceRepo::new(pool.clone())),
            request_repo: Arc::new(SqliteServiceRequestRepo::new(pool)),
        }
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(pool)
    };

    let state = build_state(config, repos.user_repo, repos.auth_repo, repos.service_repo, repos.request_repo)
        .expect("Failed to initialise auth service");

    seed_admin(&state).await.expect("Failed to seed admin account");
    state
}

pub fn build_state(
    config: &Config,
    user_repo: Arc<dyn UserRepository>,
    auth_repo: Arc<dyn AuthRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    request_repo: Arc<dyn ServiceRequestRepository>,
) -> Result<AppState, AppError> {
    let auth_service = Arc::new(AuthService::new(auth_repo.clone(), config.clone())?);

    Ok(AppState {
        config: config.clone(),
        user_repo,
        auth_repo,
        service_repo,
        request_repo,
        auth_service,
        templates: Arc::new(load_templates()),
    })
}

/// Creates the configured admin account unless an admin already exists.
pub async fn seed_admin(state: &AppState) -> Result<(), AppError> {
    if state.user_repo.admin_exists().await? {
        return Ok(());
    }

    let config = &state.config;
    if config.admin_password == "admin" {
        warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash = hash_password(&config.admin_password)?;
    let admin = User::new(config.admin_name.clone(), config.admin_email.clone(), password_hash, Role::Admin);
    let created = state.user_repo.create(&admin).await?;

    info!("Seeded admin account {}", created.email);
    Ok(())
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
