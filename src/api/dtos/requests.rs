use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::models::service::{AdditionalItem, NewServiceParams};
use crate::domain::models::service_request::{FieldErrors, RequestStatus};
use crate::domain::models::user::Role;
use crate::domain::services::validation::is_valid_email;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name".into(), "Name is required.".into());
        }
        if !is_valid_email(&self.email) {
            errors.insert("email".into(), "Enter a valid email address.".into());
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            errors.insert("password".into(), format!("Password must be at least {} characters.", MIN_PASSWORD_LEN));
        }
        if errors.is_empty() { Ok(()) } else { Err(AppError::FieldValidation(errors)) }
    }
}

/// Body of both service create and full update.
#[derive(Deserialize)]
pub struct ServicePayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
    #[serde(default)]
    pub is_special_offer: bool,
    pub special_price: Option<f64>,
    pub offer_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: String,
}

fn check_price(errors: &mut FieldErrors, key: &str, price: f64) {
    if !price.is_finite() || price < 0.0 {
        errors.insert(key.into(), "Price must be zero or more.".into());
    }
}

impl ServicePayload {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name".into(), "Name is required.".into());
        }
        check_price(&mut errors, "base_price", self.base_price);

        match (self.is_special_offer, self.special_price) {
            (true, None) => {
                errors.insert("special_price".into(), "A special offer needs a special price.".into());
            }
            (false, Some(_)) => {
                errors.insert("special_price".into(), "Special price is only allowed on a special offer.".into());
            }
            (_, Some(price)) => check_price(&mut errors, "special_price", price),
            (false, None) => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(AppError::FieldValidation(errors)) }
    }

    pub fn into_params(self) -> NewServiceParams {
        NewServiceParams {
            name: self.name.trim().to_string(),
            description: self.description,
            base_price: self.base_price,
            is_special_offer: self.is_special_offer,
            special_price: self.special_price,
            offer_end_date: self.offer_end_date,
            duration: self.duration,
        }
    }
}

#[derive(Deserialize)]
pub struct ItemPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub duration: String,
}

impl ItemPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name".into(), "Name is required.".into());
        }
        check_price(&mut errors, "price", self.price);
        if errors.is_empty() { Ok(()) } else { Err(AppError::FieldValidation(errors)) }
    }

    pub fn into_item(self, service_id: i64) -> AdditionalItem {
        AdditionalItem::new(service_id, self.name.trim().to_string(), self.description, self.price, self.duration)
    }
}

#[derive(Deserialize)]
pub struct StatusFilter {
    pub status: Option<RequestStatus>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ServicePayload {
        ServicePayload {
            name: "Deep Clean".into(),
            description: String::new(),
            base_price: 50.0,
            is_special_offer: false,
            special_price: None,
            offer_end_date: None,
            duration: "2h".into(),
        }
    }

    #[test]
    fn test_plain_service_is_valid() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn test_special_price_requires_offer_flag() {
        let p = ServicePayload { special_price: Some(40.0), ..payload() };
        match p.validate() {
            Err(AppError::FieldValidation(errors)) => assert!(errors.contains_key("special_price")),
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_prices_rejected() {
        let p = ServicePayload { base_price: -1.0, name: " ".into(), ..payload() };
        match p.validate() {
            Err(AppError::FieldValidation(errors)) => {
                assert!(errors.contains_key("base_price"));
                assert!(errors.contains_key("name"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_register_email_matches_submission_rule() {
        let request = RegisterRequest {
            name: "Ines".into(),
            email: "ines@localhost".into(),
            password: "long-enough".into(),
        };
        match request.validate() {
            Err(AppError::FieldValidation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors.contains_key("email"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }
}
