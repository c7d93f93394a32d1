use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub base_price: f64,
    pub is_special_offer: bool,
    pub special_price: Option<f64>,
    pub offer_end_date: Option<NaiveDate>,
    pub duration: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<AdditionalItem>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct AdditionalItem {
    pub id: i64,
    pub service_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
}

pub struct NewServiceParams {
    pub name: String,
    pub description: String,
    pub base_price: f64,
    pub is_special_offer: bool,
    pub special_price: Option<f64>,
    pub offer_end_date: Option<NaiveDate>,
    pub duration: String,
}

impl Service {
    /// Builds an unsaved service; `id` is assigned by the repository.
    pub fn new(params: NewServiceParams) -> Self {
        Self {
            id: 0,
            name: params.name,
            description: params.description,
            base_price: params.base_price,
            is_special_offer: params.is_special_offer,
            special_price: params.special_price,
            offer_end_date: params.offer_end_date,
            duration: params.duration,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }

    /// An offer counts as running while the flag is set and the end date has
    /// not passed. A missing end date means the offer is open-ended.
    pub fn offer_active_on(&self, today: NaiveDate) -> bool {
        self.is_special_offer
            && self.special_price.is_some()
            && self.offer_end_date.is_none_or(|end| end >= today)
    }

    /// Returns the service as customers should see it on `today`: the
    /// special price is withheld once the offer is no longer running, so
    /// downstream price calculation can rely on presence alone.
    pub fn with_offer_policy(mut self, today: NaiveDate) -> Self {
        if !self.offer_active_on(today) {
            self.is_special_offer = false;
            self.special_price = None;
            self.offer_end_date = None;
        }
        self
    }

    pub fn item(&self, item_id: i64) -> Option<&AdditionalItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn has_item(&self, item_id: i64) -> bool {
        self.item(item_id).is_some()
    }
}

impl AdditionalItem {
    pub fn new(service_id: i64, name: String, description: String, price: f64, duration: String) -> Self {
        Self {
            id: 0,
            service_id,
            name,
            description,
            price,
            duration,
        }
    }
}
