use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::Claims;
use crate::domain::models::user::SessionUser;
use crate::domain::services::auth_service::ACCESS_TOKEN_AUDIENCE;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{debug, Span};

/// Any signed-in caller. Mutating requests must echo the CSRF token from the
/// access token in the `X-CSRF-Token` header.
pub struct AuthUser(pub SessionUser);

/// A signed-in caller with the admin role.
pub struct AdminUser(pub SessionUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        let access_token = cookies.get("access_token")
            .ok_or(StatusCode::UNAUTHORIZED)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let decoding_key = DecodingKey::from_ed_pem(app_state.config.jwt_public_key.as_bytes())
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[ACCESS_TOKEN_AUDIENCE]);
        validation.set_issuer(&[app_state.config.auth_issuer.as_str()]);

        let token_data = decode::<Claims>(&access_token, &decoding_key, &validation)
            .map_err(|e| {
                debug!("Rejected access token: {}", e);
                StatusCode::UNAUTHORIZED
            })?;

        let method = &parts.method;
        if method != "GET" && method != "HEAD" && method != "OPTIONS" {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .ok_or(StatusCode::FORBIDDEN)?
                .to_str()
                .map_err(|_| StatusCode::FORBIDDEN)?;

            if csrf_header_val != token_data.claims.csrf_token {
                return Err(StatusCode::FORBIDDEN);
            }
        }

        let claims = token_data.claims;
        let user = SessionUser {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        };

        Span::current().record("user_id", &user.id);

        Ok(AuthUser(user))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            debug!("User {} is not an admin", user.id);
            return Err(StatusCode::FORBIDDEN);
        }

        Ok(AdminUser(user))
    }
}
