use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_name: String,
    pub offer_sweep_interval: Duration,
    pub submission_timeout: Duration,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs_or(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: var_or("PORT", "3000").parse().expect("PORT must be a number"),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: var_or("AUTH_ISSUER", "https://api.service-booking.local"),
            admin_email: var_or("ADMIN_EMAIL", "admin@service-booking.local"),
            admin_password: var_or("ADMIN_PASSWORD", "admin"),
            admin_name: var_or("ADMIN_NAME", "Administrator"),
            offer_sweep_interval: secs_or("OFFER_SWEEP_INTERVAL_SECS", 3600),
            submission_timeout: secs_or("SUBMISSION_TIMEOUT_SECS", 15),
        }
    }
}
