use serde::Serialize;

use crate::domain::models::service::Service;
use crate::domain::models::service_request::{RequestStatus, ServiceRequestForm};
use crate::domain::services::wizard::ServiceRequestWizard;

/// Page-load data for the three-step request wizard.
#[derive(Serialize)]
pub struct RequestFormResponse {
    pub service: Service,
    pub draft: ServiceRequestForm,
    pub step: u8,
    pub step_title: &'static str,
    pub total_price: f64,
}

impl From<&ServiceRequestWizard> for RequestFormResponse {
    fn from(wizard: &ServiceRequestWizard) -> Self {
        Self {
            service: wizard.service().clone(),
            draft: wizard.draft().clone(),
            step: wizard.step().number(),
            step_title: wizard.step().title(),
            total_price: wizard.total_price(),
        }
    }
}

#[derive(Serialize)]
pub struct StatusSummary {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub count: i64,
}

impl StatusSummary {
    pub fn new(status: RequestStatus, count: i64) -> Self {
        Self {
            key: status.as_str(),
            label: status.label(),
            color: status.badge_color(),
            icon: status.icon(),
            count,
        }
    }
}

#[derive(Serialize)]
pub struct DashboardRow {
    pub id: i64,
    pub client_name: String,
    pub service_name: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub estimated_price: String,
    pub status: StatusSummary,
}
