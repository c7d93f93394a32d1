use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, ServiceRepository, ServiceRequestRepository, UserRepository,
};
use crate::domain::services::auth_service::AuthService;
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub request_repo: Arc<dyn ServiceRequestRepository>,
    pub auth_service: Arc<AuthService>,
    pub templates: Arc<Tera>,
}
