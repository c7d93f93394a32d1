use crate::domain::{models::service::{AdditionalItem, Service}, ports::ServiceRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashMap;

const SERVICE_COLUMNS: &str = "id, name, description, base_price, is_special_offer, special_price, offer_end_date, duration, created_at";
const ITEM_COLUMNS: &str = "id, service_id, name, description, price, duration";

pub struct PostgresServiceRepo {
    pool: PgPool,
}

impl PostgresServiceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, service_id: i64) -> Result<Vec<AdditionalItem>, AppError> {
        sqlx::query_as::<_, AdditionalItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM additional_items WHERE service_id = $1 ORDER BY id ASC"
        ))
            .bind(service_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepo {
    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(&format!(
            "INSERT INTO services (name, description, base_price, is_special_offer, special_price, offer_end_date, duration, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {SERVICE_COLUMNS}"
        ))
            .bind(&service.name)
            .bind(&service.description)
            .bind(service.base_price)
            .bind(service.is_special_offer)
            .bind(service.special_price)
            .bind(service.offer_end_date)
            .bind(&service.duration)
            .bind(service.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as::<_, Service>(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match service {
            Some(mut service) => {
                service.items = self.items_for(service.id).await?;
                Ok(Some(service))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Service>, AppError> {
        let mut services = sqlx::query_as::<_, Service>(&format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY name ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let items = sqlx::query_as::<_, AdditionalItem>(&format!("SELECT {ITEM_COLUMNS} FROM additional_items ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let mut by_service: HashMap<i64, Vec<AdditionalItem>> = HashMap::new();
        for item in items {
            by_service.entry(item.service_id).or_default().push(item);
        }
        for service in &mut services {
            service.items = by_service.remove(&service.id).unwrap_or_default();
        }
        Ok(services)
    }

    async fn update(&self, service: &Service) -> Result<Service, AppError> {
        let mut updated = sqlx::query_as::<_, Service>(&format!(
            "UPDATE services SET name=$1, description=$2, base_price=$3, is_special_offer=$4, special_price=$5, offer_end_date=$6, duration=$7
             WHERE id=$8
             RETURNING {SERVICE_COLUMNS}"
        ))
            .bind(&service.name)
            .bind(&service.description)
            .bind(service.base_price)
            .bind(service.is_special_offer)
            .bind(service.special_price)
            .bind(service.offer_end_date)
            .bind(&service.duration)
            .bind(service.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Service not found".into()))?;

        updated.items = self.items_for(updated.id).await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Service not found".into()));
        }
        Ok(())
    }

    async fn create_item(&self, item: &AdditionalItem) -> Result<AdditionalItem, AppError> {
        sqlx::query_as::<_, AdditionalItem>(&format!(
            "INSERT INTO additional_items (service_id, name, description, price, duration) VALUES ($1, $2, $3, $4, $5) RETURNING {ITEM_COLUMNS}"
        ))
            .bind(item.service_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price)
            .bind(&item.duration)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_item(&self, item_id: i64) -> Result<Option<AdditionalItem>, AppError> {
        sqlx::query_as::<_, AdditionalItem>(&format!("SELECT {ITEM_COLUMNS} FROM additional_items WHERE id = $1"))
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_item(&self, item: &AdditionalItem) -> Result<AdditionalItem, AppError> {
        sqlx::query_as::<_, AdditionalItem>(&format!(
            "UPDATE additional_items SET name=$1, description=$2, price=$3, duration=$4 WHERE id=$5 RETURNING {ITEM_COLUMNS}"
        ))
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price)
            .bind(&item.duration)
            .bind(item.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Item not found".into()))
    }

    async fn delete_item(&self, item_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM additional_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item not found".into()));
        }
        Ok(())
    }

    async fn expire_offers(&self, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE services SET is_special_offer = FALSE, special_price = NULL
             WHERE is_special_offer = TRUE AND offer_end_date IS NOT NULL AND offer_end_date < $1"
        )
            .bind(today)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
