use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field name -> message, as rendered beneath the matching input.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 6] = [
        RequestStatus::Pending,
        RequestStatus::Confirmed,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
        RequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Confirmed => "confirmed",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Confirmed => "Confirmed",
            RequestStatus::InProgress => "In progress",
            RequestStatus::Completed => "Completed",
            RequestStatus::Cancelled => "Cancelled",
            RequestStatus::Rejected => "Rejected",
        }
    }

    /// Badge colour used by the dashboard.
    pub fn badge_color(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "#d97706",
            RequestStatus::Confirmed => "#2563eb",
            RequestStatus::InProgress => "#7c3aed",
            RequestStatus::Completed => "#16a34a",
            RequestStatus::Cancelled => "#6b7280",
            RequestStatus::Rejected => "#dc2626",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "clock",
            RequestStatus::Confirmed => "check",
            RequestStatus::InProgress => "loader",
            RequestStatus::Completed => "check-circle",
            RequestStatus::Cancelled => "slash",
            RequestStatus::Rejected => "x-circle",
        }
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (InProgress, Completed)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown request status: {}", s))
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The draft a customer fills in across the wizard steps. The same record is
/// the wire body of the submission endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRequestForm {
    pub service_id: i64,
    pub selected_additional_items: Vec<i64>,
    pub description: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub client_address: String,
    pub house_number: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub special_requirements: String,
    pub additional_notes: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ServiceRequest {
    pub id: i64,
    pub service_id: i64,
    pub user_id: String,
    pub description: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub client_address: String,
    pub house_number: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    pub special_requirements: Option<String>,
    pub additional_notes: Option<String>,
    pub estimated_price: f64,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub selected_additional_items: Vec<i64>,
}

/// A submission that has passed validation, with typed schedule fields.
pub struct NewServiceRequestParams {
    pub user_id: String,
    pub form: ServiceRequestForm,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    pub estimated_price: f64,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

impl ServiceRequest {
    pub fn new(params: NewServiceRequestParams) -> Self {
        let now = Utc::now();
        let form = params.form;

        let mut selected = form.selected_additional_items;
        selected.sort_unstable();
        selected.dedup();

        Self {
            id: 0,
            service_id: form.service_id,
            user_id: params.user_id,
            description: form.description.trim().to_string(),
            client_name: form.client_name.trim().to_string(),
            client_email: form.client_email.trim().to_string(),
            client_phone: form.client_phone.trim().to_string(),
            client_address: form.client_address.trim().to_string(),
            house_number: form.house_number.trim().to_string(),
            city: form.city.trim().to_string(),
            state: form.state.trim().to_string(),
            postal_code: form.postal_code.trim().to_string(),
            country: form.country.trim().to_string(),
            preferred_date: params.preferred_date,
            preferred_time: params.preferred_time,
            special_requirements: non_empty(form.special_requirements),
            additional_notes: non_empty(form.additional_notes),
            estimated_price: params.estimated_price,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
            selected_additional_items: selected,
        }
    }
}
