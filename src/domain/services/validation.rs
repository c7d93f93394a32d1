use chrono::{NaiveDate, NaiveTime};

use crate::domain::models::{
    service::Service,
    service_request::{FieldErrors, ServiceRequestForm},
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Schedule fields of a submission that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidSchedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Non-empty local part and a dotted domain. Shared by account registration
/// and request submission.
pub fn is_valid_email(email: &str) -> bool {
    email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.contains('@') && domain.contains('.')
        })
}

fn require(errors: &mut FieldErrors, key: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(key.to_string(), message.to_string());
    }
}

/// Checks a submitted draft against the service it targets. Every problem is
/// reported, keyed by the form field it belongs to.
pub fn validate_submission(
    form: &ServiceRequestForm,
    service: &Service,
    today: NaiveDate,
) -> Result<ValidSchedule, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(unknown) = form
        .selected_additional_items
        .iter()
        .find(|id| !service.has_item(**id))
    {
        errors.insert(
            "selected_additional_items".into(),
            format!("Item {} is not available for {}.", unknown, service.name),
        );
    }

    require(&mut errors, "client_name", &form.client_name, "Full name is required.");
    require(&mut errors, "client_email", &form.client_email, "Email address is required.");
    require(&mut errors, "client_phone", &form.client_phone, "Phone number is required.");
    require(&mut errors, "client_address", &form.client_address, "Street address is required.");
    require(&mut errors, "city", &form.city, "City is required.");
    require(&mut errors, "postal_code", &form.postal_code, "Postal code is required.");
    require(&mut errors, "country", &form.country, "Country is required.");

    let email = form.client_email.trim();
    if !email.is_empty() && !is_valid_email(email) {
        errors.insert("client_email".into(), "Enter a valid email address.".into());
    }

    let date = match form.preferred_date.trim() {
        "" => {
            errors.insert("preferred_date".into(), "Preferred date is required.".into());
            None
        }
        raw => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) if date < today => {
                errors.insert("preferred_date".into(), "Preferred date cannot be in the past.".into());
                None
            }
            Ok(date) => Some(date),
            Err(_) => {
                errors.insert("preferred_date".into(), "Use the YYYY-MM-DD format.".into());
                None
            }
        },
    };

    let time = match form.preferred_time.trim() {
        "" => {
            errors.insert("preferred_time".into(), "Preferred time is required.".into());
            None
        }
        raw => match NaiveTime::parse_from_str(raw, TIME_FORMAT) {
            Ok(time) => Some(time),
            Err(_) => {
                errors.insert("preferred_time".into(), "Use the HH:MM format.".into());
                None
            }
        },
    };

    match (date, time) {
        (Some(date), Some(time)) if errors.is_empty() => Ok(ValidSchedule { date, time }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::service::{AdditionalItem, NewServiceParams};

    fn service() -> Service {
        let mut s = Service::new(NewServiceParams {
            name: "Carpet Cleaning".into(),
            description: String::new(),
            base_price: 30.0,
            is_special_offer: false,
            special_price: None,
            offer_end_date: None,
            duration: "1 hour".into(),
        });
        s.id = 2;
        let mut item = AdditionalItem::new(2, "Stain treatment".into(), String::new(), 8.0, "20 min".into());
        item.id = 5;
        s.items.push(item);
        s
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn complete_form() -> ServiceRequestForm {
        ServiceRequestForm {
            service_id: 2,
            selected_additional_items: vec![5],
            client_name: "Ines Costa".into(),
            client_email: "ines@example.com".into(),
            client_phone: "+351 900 000 000".into(),
            client_address: "Rua Augusta".into(),
            house_number: "12".into(),
            city: "Lisboa".into(),
            postal_code: "1100-053".into(),
            country: "Portugal".into(),
            preferred_date: "2026-05-03".into(),
            preferred_time: "09:30".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_form_passes() {
        let schedule = validate_submission(&complete_form(), &service(), today()).unwrap();
        assert_eq!(schedule.date, NaiveDate::from_ymd_opt(2026, 5, 3).unwrap());
        assert_eq!(schedule.time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let form = ServiceRequestForm { service_id: 2, ..Default::default() };
        let errors = validate_submission(&form, &service(), today()).unwrap_err();
        for key in ["client_name", "client_email", "client_phone", "client_address", "city", "postal_code", "country", "preferred_date", "preferred_time"] {
            assert!(errors.contains_key(key), "missing error for {}", key);
        }
        assert!(!errors.contains_key("house_number"));
        assert!(!errors.contains_key("state"));
    }

    #[test]
    fn test_foreign_item_rejected() {
        let mut form = complete_form();
        form.selected_additional_items = vec![5, 77];
        let errors = validate_submission(&form, &service(), today()).unwrap_err();
        assert!(errors["selected_additional_items"].contains("77"));
    }

    #[test]
    fn test_schedule_formats() {
        let mut form = complete_form();
        form.preferred_date = "03/05/2026".into();
        form.preferred_time = "9am".into();
        let errors = validate_submission(&form, &service(), today()).unwrap_err();
        assert_eq!(errors["preferred_date"], "Use the YYYY-MM-DD format.");
        assert_eq!(errors["preferred_time"], "Use the HH:MM format.");

        form.preferred_date = "2026-04-30".into();
        form.preferred_time = "10:00".into();
        let errors = validate_submission(&form, &service(), today()).unwrap_err();
        assert_eq!(errors["preferred_date"], "Preferred date cannot be in the past.");
    }

    #[test]
    fn test_malformed_email() {
        let mut form = complete_form();
        form.client_email = "ines.example.com".into();
        let errors = validate_submission(&form, &service(), today()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("client_email"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ines@example.com"));
        assert!(is_valid_email("  ines@mail.example.org "));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ines@localhost"));
        assert!(!is_valid_email("ines@a@b.com"));
        assert!(!is_valid_email("ines.example.com"));
    }
}
