use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::domain::models::service_request::{FieldErrors, ServiceRequestForm};
use crate::domain::ports::{RequestSubmitter, SubmissionReceipt};
use crate::error::SubmissionError;

const SUBMIT_PATH: &str = "/api/v1/service-requests";

/// Posts wizard drafts to the booking API on behalf of a signed-in user.
pub struct HttpRequestSubmitter {
    client: Client,
    base_url: String,
    access_token: String,
    csrf_token: String,
}

#[derive(Deserialize)]
struct RejectionBody {
    #[serde(default)]
    errors: FieldErrors,
}

impl HttpRequestSubmitter {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        csrf_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmissionError::Unreachable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            csrf_token: csrf_token.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, SUBMIT_PATH)
    }
}

#[async_trait]
impl RequestSubmitter for HttpRequestSubmitter {
    async fn submit(&self, form: &ServiceRequestForm) -> Result<SubmissionReceipt, SubmissionError> {
        let res = self.client.post(self.endpoint())
            .header("Cookie", format!("access_token={}", self.access_token))
            .header("X-CSRF-Token", &self.csrf_token)
            .json(form)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_timeout() {
                    format!("Booking service did not answer in time: {}", e)
                } else {
                    format!("Booking service connection error: {}", e)
                };
                error!("{}", msg);
                SubmissionError::Unreachable(msg)
            })?;

        let status = res.status();
        match status {
            StatusCode::CREATED | StatusCode::OK => {
                let receipt = res.json::<SubmissionReceipt>().await.map_err(|e| {
                    error!("Malformed submission receipt: {}", e);
                    SubmissionError::Unexpected { status: status.as_u16(), body: e.to_string() }
                })?;
                debug!("Service request {} accepted", receipt.id);
                Ok(receipt)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let body = res.json::<RejectionBody>().await.map_err(|e| {
                    SubmissionError::Unexpected { status: status.as_u16(), body: e.to_string() }
                })?;
                warn!("Service request rejected on {} field(s)", body.errors.len());
                Err(SubmissionError::Rejected(body.errors))
            }
            _ => {
                let body = res.text().await.unwrap_or_else(|e| {
                    warn!("Failed to read error body from booking service: {}", e);
                    String::new()
                });
                error!("Booking service returned {}: {}", status, body);
                Err(SubmissionError::Unexpected { status: status.as_u16(), body })
            }
        }
    }
}
