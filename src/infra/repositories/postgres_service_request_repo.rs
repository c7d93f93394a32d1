use crate::domain::{
    models::service_request::{RequestStatus, ServiceRequest},
    ports::ServiceRequestRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;

const REQUEST_COLUMNS: &str = "id, service_id, user_id, description, client_name, client_email, client_phone, client_address, house_number, city, state, postal_code, country, preferred_date, preferred_time, special_requirements, additional_notes, estimated_price, status, created_at, updated_at";

pub struct PostgresServiceRequestRepo {
    pool: PgPool,
}

impl PostgresServiceRequestRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_items(&self, mut request: ServiceRequest) -> Result<ServiceRequest, AppError> {
        request.selected_additional_items = sqlx::query_scalar::<_, i64>(
            "SELECT item_id FROM service_request_items WHERE request_id = $1 ORDER BY item_id ASC"
        )
            .bind(request.id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(request)
    }

    async fn attach_all(&self, requests: Vec<ServiceRequest>) -> Result<Vec<ServiceRequest>, AppError> {
        let mut out = Vec::with_capacity(requests.len());
        for request in requests {
            out.push(self.attach_items(request).await?);
        }
        Ok(out)
    }
}

#[async_trait]
impl ServiceRequestRepository for PostgresServiceRequestRepo {
    async fn create(&self, request: &ServiceRequest) -> Result<ServiceRequest, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let mut created = sqlx::query_as::<_, ServiceRequest>(&format!(
            "INSERT INTO service_requests (service_id, user_id, description, client_name, client_email, client_phone, client_address, house_number, city, state, postal_code, country, preferred_date, preferred_time, special_requirements, additional_notes, estimated_price, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
             RETURNING {REQUEST_COLUMNS}"
        ))
            .bind(request.service_id).bind(&request.user_id).bind(&request.description)
            .bind(&request.client_name).bind(&request.client_email).bind(&request.client_phone)
            .bind(&request.client_address).bind(&request.house_number).bind(&request.city)
            .bind(&request.state).bind(&request.postal_code).bind(&request.country)
            .bind(request.preferred_date).bind(request.preferred_time)
            .bind(&request.special_requirements).bind(&request.additional_notes)
            .bind(request.estimated_price).bind(request.status.as_str())
            .bind(request.created_at).bind(request.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for item_id in &request.selected_additional_items {
            sqlx::query("INSERT INTO service_request_items (request_id, item_id) VALUES ($1, $2)")
                .bind(created.id)
                .bind(item_id)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        created.selected_additional_items = request.selected_additional_items.clone();
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ServiceRequest>, AppError> {
        let request = sqlx::query_as::<_, ServiceRequest>(&format!("SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match request {
            Some(request) => Ok(Some(self.attach_items(request).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<ServiceRequest>, AppError> {
        let requests = match status {
            Some(status) => {
                sqlx::query_as::<_, ServiceRequest>(&format!(
                    "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE status = $1 ORDER BY created_at DESC, id DESC"
                ))
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, ServiceRequest>(&format!(
                    "SELECT {REQUEST_COLUMNS} FROM service_requests ORDER BY created_at DESC, id DESC"
                ))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(AppError::Database)?;

        self.attach_all(requests).await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<ServiceRequest>, AppError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.attach_all(requests).await
    }

    async fn update_status(&self, id: i64, from: RequestStatus, to: RequestStatus) -> Result<ServiceRequest, AppError> {
        let updated = sqlx::query_as::<_, ServiceRequest>(&format!(
            "UPDATE service_requests SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING {REQUEST_COLUMNS}"
        ))
            .bind(to.as_str())
            .bind(Utc::now())
            .bind(id)
            .bind(from.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match updated {
            Some(request) => self.attach_items(request).await,
            None => match self.find_by_id(id).await? {
                Some(current) => Err(AppError::Conflict(format!(
                    "Service request is {}, expected {}",
                    current.status, from
                ))),
                None => Err(AppError::NotFound("Service request not found".into())),
            },
        }
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ServiceRequest>, AppError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.attach_all(requests).await
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Service request not found".into()));
        }
        Ok(())
    }

    async fn count_by_status(&self) -> Result<Vec<(RequestStatus, i64)>, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT status, COUNT(*) FROM service_requests GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| match status.parse::<RequestStatus>() {
                Ok(status) => Some((status, count)),
                Err(e) => {
                    warn!("Skipping row with {}", e);
                    None
                }
            })
            .collect())
    }
}
