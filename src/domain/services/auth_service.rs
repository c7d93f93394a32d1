use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RefreshTokenRecord}, user::User},
    ports::AuthRepository
};
use crate::error::AppError;
use crate::config::Config;
use argon2::{password_hash::{SaltString, PasswordHash, PasswordHasher, PasswordVerifier}, Argon2};
use jsonwebtoken::{encode, EncodingKey, Header, Algorithm};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Sha256, Digest};

pub const ACCESS_TOKEN_AUDIENCE: &str = "service-booking-frontend";

/// Access token, refresh token, CSRF token.
pub type TokenTriple = (String, String, String);

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal)?;

    Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized)
}

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    config: Config,
    encoding_key: EncodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, config: Config) -> Result<Self, AppError> {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid JWT private key PEM: {}", e)))?;

        Ok(Self { repo, config, encoding_key })
    }

    pub async fn login(&self, user: &User) -> Result<TokenTriple, AppError> {
        let family_id = Uuid::new_v4();
        self.issue_token_pair(user, family_id, 1).await
    }

    pub async fn refresh(&self, raw_refresh_token: &str, user: &User) -> Result<TokenTriple, AppError> {
        let token_hash = self.hash_token(raw_refresh_token);

        let record = self.repo.find_refresh_token(&token_hash).await?
            .ok_or(AppError::Unauthorized)?;

        if record.expires_at < Utc::now() {
            self.repo.delete_refresh_token(&token_hash).await?;
            return Err(AppError::Unauthorized);
        }

        self.repo.delete_refresh_token(&token_hash).await?;
        self.issue_token_pair(user, record.family_id, record.generation_id + 1).await
    }

    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        if let Some(record) = self.repo.find_refresh_token(&token_hash).await? {
            self.repo.delete_refresh_family(record.family_id).await?;
        }
        Ok(())
    }

    async fn issue_token_pair(&self, user: &User, family_id: Uuid, generation_id: i32) -> Result<TokenTriple, AppError> {
        let csrf_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let now = Utc::now();
        let exp = (now + Duration::minutes(15)).timestamp() as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: user.id.clone(),
            aud: ACCESS_TOKEN_AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
            csrf_token: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        let refresh_token_hash = self.hash_token(&refresh_token);

        let refresh_record = RefreshTokenRecord {
            token_hash: refresh_token_hash,
            user_id: user.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(7),
            created_at: now,
        };

        self.repo.create_refresh_token(&refresh_record).await?;
        Ok((access_token, refresh_token, csrf_token))
    }

    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(verify_password("wrong", &hash), Err(AppError::Unauthorized)));
    }
}
