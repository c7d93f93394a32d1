//! Three-step service request wizard.
//!
//! The wizard owns the draft a customer builds up while requesting a service:
//! which add-ons they picked, where the work happens and when. It moves
//! linearly through [`WizardStep`]s and hands the finished draft to a
//! [`RequestSubmitter`] exactly once per accepted submission.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::models::{
    service::Service,
    service_request::{FieldErrors, ServiceRequestForm},
    user::SessionUser,
};
use crate::domain::ports::{RequestSubmitter, SubmissionReceipt};
use crate::domain::services::pricing::calculate_total_price;
use crate::error::SubmissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    ServiceDetails,
    ContactInformation,
    ScheduleAndNotes,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::ServiceDetails => 1,
            WizardStep::ContactInformation => 2,
            WizardStep::ScheduleAndNotes => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::ServiceDetails => "Service Details",
            WizardStep::ContactInformation => "Contact Information",
            WizardStep::ScheduleAndNotes => "Schedule & Notes",
        }
    }

    fn following(&self) -> Option<WizardStep> {
        match self {
            WizardStep::ServiceDetails => Some(WizardStep::ContactInformation),
            WizardStep::ContactInformation => Some(WizardStep::ScheduleAndNotes),
            WizardStep::ScheduleAndNotes => None,
        }
    }

    fn preceding(&self) -> Option<WizardStep> {
        match self {
            WizardStep::ServiceDetails => None,
            WizardStep::ContactInformation => Some(WizardStep::ServiceDetails),
            WizardStep::ScheduleAndNotes => Some(WizardStep::ContactInformation),
        }
    }
}

/// Editable text fields of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Description,
    ClientName,
    ClientEmail,
    ClientPhone,
    ClientAddress,
    HouseNumber,
    City,
    State,
    PostalCode,
    Country,
    PreferredDate,
    PreferredTime,
    SpecialRequirements,
    AdditionalNotes,
}

impl DraftField {
    pub const ALL: [DraftField; 14] = [
        DraftField::Description,
        DraftField::ClientName,
        DraftField::ClientEmail,
        DraftField::ClientPhone,
        DraftField::ClientAddress,
        DraftField::HouseNumber,
        DraftField::City,
        DraftField::State,
        DraftField::PostalCode,
        DraftField::Country,
        DraftField::PreferredDate,
        DraftField::PreferredTime,
        DraftField::SpecialRequirements,
        DraftField::AdditionalNotes,
    ];

    /// Key used on the wire and in backend error maps.
    pub fn key(&self) -> &'static str {
        match self {
            DraftField::Description => "description",
            DraftField::ClientName => "client_name",
            DraftField::ClientEmail => "client_email",
            DraftField::ClientPhone => "client_phone",
            DraftField::ClientAddress => "client_address",
            DraftField::HouseNumber => "house_number",
            DraftField::City => "city",
            DraftField::State => "state",
            DraftField::PostalCode => "postal_code",
            DraftField::Country => "country",
            DraftField::PreferredDate => "preferred_date",
            DraftField::PreferredTime => "preferred_time",
            DraftField::SpecialRequirements => "special_requirements",
            DraftField::AdditionalNotes => "additional_notes",
        }
    }

    /// The step whose screen renders this field.
    pub fn step(&self) -> WizardStep {
        match self {
            DraftField::Description => WizardStep::ServiceDetails,
            DraftField::ClientName
            | DraftField::ClientEmail
            | DraftField::ClientPhone
            | DraftField::ClientAddress
            | DraftField::HouseNumber
            | DraftField::City
            | DraftField::State
            | DraftField::PostalCode
            | DraftField::Country => WizardStep::ContactInformation,
            DraftField::PreferredDate
            | DraftField::PreferredTime
            | DraftField::SpecialRequirements
            | DraftField::AdditionalNotes => WizardStep::ScheduleAndNotes,
        }
    }

    pub fn from_key(key: &str) -> Option<DraftField> {
        DraftField::ALL.into_iter().find(|f| f.key() == key)
    }

    fn slot<'a>(&self, form: &'a mut ServiceRequestForm) -> &'a mut String {
        match self {
            DraftField::Description => &mut form.description,
            DraftField::ClientName => &mut form.client_name,
            DraftField::ClientEmail => &mut form.client_email,
            DraftField::ClientPhone => &mut form.client_phone,
            DraftField::ClientAddress => &mut form.client_address,
            DraftField::HouseNumber => &mut form.house_number,
            DraftField::City => &mut form.city,
            DraftField::State => &mut form.state,
            DraftField::PostalCode => &mut form.postal_code,
            DraftField::Country => &mut form.country,
            DraftField::PreferredDate => &mut form.preferred_date,
            DraftField::PreferredTime => &mut form.preferred_time,
            DraftField::SpecialRequirements => &mut form.special_requirements,
            DraftField::AdditionalNotes => &mut form.additional_notes,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("item {0} is not offered with this service")]
    UnknownItem(i64),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("submission is only possible from the final step")]
    NotOnFinalStep,
}

/// Set of selected add-on ids. Unique by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<i64>,
}

impl Selection {
    /// Returns `true` if the id was not selected before.
    pub fn add(&mut self, item_id: i64) -> bool {
        self.ids.insert(item_id)
    }

    /// Returns `true` if the id was selected.
    pub fn remove(&mut self, item_id: i64) -> bool {
        self.ids.remove(&item_id)
    }

    pub fn contains(&self, item_id: i64) -> bool {
        self.ids.contains(&item_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &i64> {
        self.ids.iter()
    }

    /// Ascending ids, the form the draft serialises.
    pub fn to_vec(&self) -> Vec<i64> {
        self.ids.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend stored the request; the draft has been reset.
    Accepted(SubmissionReceipt),
    /// The backend returned per-field messages, now available via
    /// [`ServiceRequestWizard::error_for`].
    Rejected,
    /// Transport or unexpected failure, available via
    /// [`ServiceRequestWizard::submission_error`].
    Failed,
}

#[derive(Debug, Clone)]
pub struct ServiceRequestWizard {
    service: Service,
    step: WizardStep,
    selection: Selection,
    draft: ServiceRequestForm,
    mounted: ServiceRequestForm,
    processing: bool,
    errors: FieldErrors,
    submission_error: Option<String>,
}

impl ServiceRequestWizard {
    /// Starts a wizard for `service`, pre-filling the contact name and email
    /// from the caller's session.
    pub fn mount(service: Service, user: &SessionUser) -> Self {
        let draft = ServiceRequestForm {
            service_id: service.id,
            client_name: user.name.clone(),
            client_email: user.email.clone(),
            ..Default::default()
        };

        debug!(service_id = service.id, user_id = %user.id, "wizard mounted");

        Self {
            service,
            step: WizardStep::ServiceDetails,
            selection: Selection::default(),
            mounted: draft.clone(),
            draft,
            processing: false,
            errors: FieldErrors::new(),
            submission_error: None,
        }
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_final_step(&self) -> bool {
        self.step == WizardStep::ScheduleAndNotes
    }

    pub fn draft(&self) -> &ServiceRequestForm {
        &self.draft
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    /// Earliest step that shows one of the current field errors.
    pub fn first_error_step(&self) -> Option<WizardStep> {
        self.errors
            .keys()
            .map(|key| match DraftField::from_key(key) {
                Some(field) => field.step(),
                None => WizardStep::ServiceDetails,
            })
            .min()
    }

    pub fn total_price(&self) -> f64 {
        calculate_total_price(&self.service, self.selection.iter())
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_idle()?;
        *field.slot(&mut self.draft) = value.into();
        Ok(())
    }

    pub fn add_item(&mut self, item_id: i64) -> Result<bool, WizardError> {
        self.ensure_idle()?;
        if !self.service.has_item(item_id) {
            return Err(WizardError::UnknownItem(item_id));
        }
        let added = self.selection.add(item_id);
        self.sync_selection();
        Ok(added)
    }

    pub fn remove_item(&mut self, item_id: i64) -> Result<bool, WizardError> {
        self.ensure_idle()?;
        let removed = self.selection.remove(item_id);
        self.sync_selection();
        Ok(removed)
    }

    /// Moves one step forward. Returns `false` on the final step, where going
    /// forward means submitting instead.
    pub fn next(&mut self) -> bool {
        if self.processing {
            return false;
        }
        match self.step.following() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    /// Moves one step back. Returns `false` on the first step.
    pub fn previous(&mut self) -> bool {
        if self.processing {
            return false;
        }
        match self.step.preceding() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    /// Marks the wizard busy and returns the payload to send. Every input is
    /// refused until [`finish_submission`](Self::finish_submission) runs.
    pub fn begin_submission(&mut self) -> Result<ServiceRequestForm, WizardError> {
        self.ensure_idle()?;
        if !self.is_final_step() {
            return Err(WizardError::NotOnFinalStep);
        }
        self.processing = true;
        self.errors.clear();
        self.submission_error = None;
        Ok(self.draft.clone())
    }

    pub fn finish_submission(&mut self, result: Result<SubmissionReceipt, SubmissionError>) -> SubmitOutcome {
        self.processing = false;
        match result {
            Ok(receipt) => {
                info!(request_id = receipt.id, "service request accepted");
                self.reset();
                SubmitOutcome::Accepted(receipt)
            }
            Err(SubmissionError::Rejected(errors)) => {
                debug!(fields = errors.len(), "service request rejected by backend");
                self.errors = errors;
                SubmitOutcome::Rejected
            }
            Err(e) => {
                warn!("service request submission failed: {}", e);
                self.submission_error = Some(e.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn submit(&mut self, submitter: &dyn RequestSubmitter) -> Result<SubmitOutcome, WizardError> {
        let payload = self.begin_submission()?;
        let result = submitter.submit(&payload).await;
        Ok(self.finish_submission(result))
    }

    fn reset(&mut self) {
        self.draft = self.mounted.clone();
        self.selection.clear();
        self.step = WizardStep::ServiceDetails;
        self.errors.clear();
        self.submission_error = None;
    }

    fn sync_selection(&mut self) {
        self.draft.selected_additional_items = self.selection.to_vec();
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.processing {
            Err(WizardError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::service::{AdditionalItem, NewServiceParams};
    use crate::domain::models::service_request::RequestStatus;
    use crate::domain::models::user::Role;
    use async_trait::async_trait;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn window_cleaning() -> Service {
        let mut s = Service::new(NewServiceParams {
            name: "Window Cleaning".into(),
            description: "Inside and out".into(),
            base_price: 50.0,
            is_special_offer: false,
            special_price: None,
            offer_end_date: None,
            duration: "2 hours".into(),
        });
        s.id = 7;
        s.items = [(11, 10.0), (12, 15.0), (13, 4.5)]
            .into_iter()
            .map(|(id, price)| {
                let mut item = AdditionalItem::new(7, format!("Extra {}", id), String::new(), price, "15 min".into());
                item.id = id;
                item
            })
            .collect();
        s
    }

    fn customer() -> SessionUser {
        SessionUser {
            id: "u-1".into(),
            name: "Maria Lopez".into(),
            email: "maria@example.com".into(),
            role: Role::Customer,
        }
    }

    struct CountingSubmitter {
        calls: AtomicUsize,
        response: Mutex<Option<Result<SubmissionReceipt, SubmissionError>>>,
    }

    impl CountingSubmitter {
        fn answering(response: Result<SubmissionReceipt, SubmissionError>) -> Self {
            Self { calls: AtomicUsize::new(0), response: Mutex::new(Some(response)) }
        }
    }

    #[async_trait]
    impl RequestSubmitter for CountingSubmitter {
        async fn submit(&self, _form: &ServiceRequestForm) -> Result<SubmissionReceipt, SubmissionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.lock().unwrap().take().expect("submitter called more than once")
        }
    }

    fn receipt() -> SubmissionReceipt {
        SubmissionReceipt { id: 42, status: RequestStatus::Pending, estimated_price: 60.0 }
    }

    fn to_final_step(w: &mut ServiceRequestWizard) {
        while w.next() {}
    }

    #[test]
    fn test_mount_prefills_identity() {
        let w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        assert_eq!(w.step(), WizardStep::ServiceDetails);
        assert_eq!(w.draft().service_id, 7);
        assert_eq!(w.draft().client_name, "Maria Lopez");
        assert_eq!(w.draft().client_email, "maria@example.com");
        assert!(w.draft().selected_additional_items.is_empty());
        assert_eq!(w.total_price(), 50.0);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        assert_eq!(w.add_item(11), Ok(true));
        assert_eq!(w.add_item(11), Ok(false));
        assert_eq!(w.add_item(11), Ok(false));
        assert_eq!(w.selection().len(), 1);
        assert_eq!(w.draft().selected_additional_items, vec![11]);
    }

    #[test]
    fn test_unknown_item_rejected() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        assert_eq!(w.add_item(99), Err(WizardError::UnknownItem(99)));
        assert!(w.selection().is_empty());
        assert_eq!(w.remove_item(99), Ok(false));
    }

    #[test]
    fn test_selection_and_draft_never_diverge() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        for _ in 0..500 {
            let id = rng.gen_range(11..=13);
            if rng.gen_bool(0.6) {
                w.add_item(id).unwrap();
            } else {
                w.remove_item(id).unwrap();
            }
            assert_eq!(w.draft().selected_additional_items, w.selection().to_vec());
            let mut sorted = w.draft().selected_additional_items.clone();
            sorted.dedup();
            assert_eq!(sorted.len(), w.selection().len());
        }
    }

    #[test]
    fn test_total_tracks_selection() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        w.add_item(11).unwrap();
        w.add_item(12).unwrap();
        assert_eq!(w.total_price(), 75.0);
        w.remove_item(11).unwrap();
        assert_eq!(w.total_price(), 65.0);
    }

    #[test]
    fn test_step_bounds_are_no_ops() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        assert!(!w.previous());
        assert_eq!(w.step().number(), 1);

        assert!(w.next());
        assert!(w.next());
        assert_eq!(w.step(), WizardStep::ScheduleAndNotes);
        assert!(!w.next());
        assert_eq!(w.step().number(), 3);

        assert!(w.previous());
        assert_eq!(w.step(), WizardStep::ContactInformation);
    }

    #[test]
    fn test_cannot_submit_before_final_step() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        assert_eq!(w.begin_submission(), Err(WizardError::NotOnFinalStep));
        assert!(!w.is_processing());
    }

    #[test]
    fn test_second_submit_refused_while_processing() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        to_final_step(&mut w);

        let payload = w.begin_submission().unwrap();
        assert_eq!(payload.service_id, 7);
        assert!(w.is_processing());

        assert_eq!(w.begin_submission(), Err(WizardError::SubmissionInFlight));
        assert_eq!(w.set_field(DraftField::City, "Lyon"), Err(WizardError::SubmissionInFlight));
        assert_eq!(w.add_item(11), Err(WizardError::SubmissionInFlight));
        assert!(!w.previous());

        w.finish_submission(Err(SubmissionError::Unreachable("timed out".into())));
        assert!(!w.is_processing());
        assert!(w.begin_submission().is_ok());
    }

    #[tokio::test]
    async fn test_submit_calls_backend_once_and_resets() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        w.add_item(13).unwrap();
        w.set_field(DraftField::City, "Porto").unwrap();
        to_final_step(&mut w);

        let submitter = CountingSubmitter::answering(Ok(receipt()));
        let outcome = w.submit(&submitter).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Accepted(receipt()));
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(w.step(), WizardStep::ServiceDetails);
        assert!(w.selection().is_empty());
        assert_eq!(w.draft().city, "");
        assert_eq!(w.draft().client_name, "Maria Lopez");
    }

    #[tokio::test]
    async fn test_rejection_keeps_draft_and_exposes_field_errors() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        w.set_field(DraftField::ClientPhone, "").unwrap();
        to_final_step(&mut w);

        let mut errors = FieldErrors::new();
        errors.insert("client_phone".into(), "Phone number is required.".into());
        errors.insert("preferred_date".into(), "Choose a date.".into());
        let submitter = CountingSubmitter::answering(Err(SubmissionError::Rejected(errors)));

        let outcome = w.submit(&submitter).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert!(!w.is_processing());
        assert_eq!(w.error_for("client_phone"), Some("Phone number is required."));
        assert_eq!(w.first_error_step(), Some(WizardStep::ContactInformation));
        assert_eq!(w.step(), WizardStep::ScheduleAndNotes);
        assert_eq!(w.draft().client_name, "Maria Lopez");
    }

    #[tokio::test]
    async fn test_transport_failure_reenables_form() {
        let mut w = ServiceRequestWizard::mount(window_cleaning(), &customer());
        to_final_step(&mut w);

        let submitter = CountingSubmitter::answering(Err(SubmissionError::Unreachable("connection refused".into())));
        let outcome = w.submit(&submitter).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(!w.is_processing());
        assert!(w.submission_error().unwrap().contains("connection refused"));
        assert!(w.errors().is_empty());
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in DraftField::ALL {
            assert_eq!(DraftField::from_key(field.key()), Some(field));
        }
        assert_eq!(DraftField::from_key("service_id"), None);
    }
}
