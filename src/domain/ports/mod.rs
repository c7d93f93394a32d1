use crate::domain::models::{
    auth::RefreshTokenRecord,
    service::{AdditionalItem, Service},
    service_request::{RequestStatus, ServiceRequest, ServiceRequestForm},
    user::User,
};
use crate::error::{AppError, SubmissionError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn admin_exists(&self) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Service>, AppError>;
    async fn list(&self) -> Result<Vec<Service>, AppError>;
    async fn update(&self, service: &Service) -> Result<Service, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    async fn create_item(&self, item: &AdditionalItem) -> Result<AdditionalItem, AppError>;
    async fn find_item(&self, item_id: i64) -> Result<Option<AdditionalItem>, AppError>;
    async fn update_item(&self, item: &AdditionalItem) -> Result<AdditionalItem, AppError>;
    async fn delete_item(&self, item_id: i64) -> Result<(), AppError>;

    /// Clears special-offer fields on every service whose offer ended before
    /// `today`. Returns how many services were changed.
    async fn expire_offers(&self, today: NaiveDate) -> Result<u64, AppError>;
}

#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    async fn create(&self, request: &ServiceRequest) -> Result<ServiceRequest, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<ServiceRequest>, AppError>;
    async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<ServiceRequest>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<ServiceRequest>, AppError>;
    /// Moves a request from `from` to `to` in one step. Fails with `Conflict`
    /// when the stored status is no longer `from`.
    async fn update_status(&self, id: i64, from: RequestStatus, to: RequestStatus) -> Result<ServiceRequest, AppError>;
    /// Newest requests first, at most `limit` of them.
    async fn recent(&self, limit: i64) -> Result<Vec<ServiceRequest>, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn count_by_status(&self) -> Result<Vec<(RequestStatus, i64)>, AppError>;
}

/// What the backend hands back once a submission is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: i64,
    pub status: RequestStatus,
    pub estimated_price: f64,
}

/// Client-side seam the wizard submits through.
#[async_trait]
pub trait RequestSubmitter: Send + Sync {
    async fn submit(&self, form: &ServiceRequestForm) -> Result<SubmissionReceipt, SubmissionError>;
}
