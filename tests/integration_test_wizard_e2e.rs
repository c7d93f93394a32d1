mod common;

use chrono::Utc;
use common::{AuthHeaders, TestApp};
use serde_json::json;
use service_booking::{
    domain::models::service_request::{RequestStatus, ServiceRequestForm},
    domain::ports::RequestSubmitter,
    error::SubmissionError,
    domain::models::user::SessionUser,
    domain::services::wizard::{DraftField, ServiceRequestWizard, SubmitOutcome, WizardStep},
    infra::http::http_request_submitter::HttpRequestSubmitter,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves the app on an ephemeral port and returns its base URL.
async fn serve(app: &TestApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn mounted_wizard(app: &TestApp, service_id: i64, email: &str) -> ServiceRequestWizard {
    let user = app.state.user_repo.find_by_email(email).await.unwrap().unwrap();
    let service = app.state.service_repo.find_by_id(service_id).await.unwrap().unwrap()
        .with_offer_policy(Utc::now().date_naive());
    ServiceRequestWizard::mount(service, &SessionUser::from(&user))
}

fn fill_contact_and_schedule(wizard: &mut ServiceRequestWizard, date: &str) {
    let values = [
        (DraftField::Description, "Spring clean"),
        (DraftField::ClientPhone, "+1 555 0100"),
        (DraftField::ClientAddress, "Main Street"),
        (DraftField::HouseNumber, "12"),
        (DraftField::City, "Springfield"),
        (DraftField::PostalCode, "62701"),
        (DraftField::Country, "USA"),
        (DraftField::PreferredDate, date),
        (DraftField::PreferredTime, "14:00"),
    ];
    for (field, value) in values {
        wizard.set_field(field, value).unwrap();
    }
}

fn submitter(app: &TestApp, base_url: &str, auth: &AuthHeaders) -> HttpRequestSubmitter {
    HttpRequestSubmitter::new(
        base_url,
        auth.access_token.clone(),
        auth.csrf_token.clone(),
        app.state.config.submission_timeout,
    )
    .unwrap()
}

#[tokio::test]
async fn test_wizard_submits_over_http() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let service_id = app.create_service(&admin, json!({
        "name": "Deep Clean",
        "base_price": 50.0,
        "is_special_offer": true,
        "special_price": 40.0
    })).await;
    let oven = app.create_item(&admin, service_id, "Oven", 20.0).await;
    let fridge = app.create_item(&admin, service_id, "Fridge", 15.0).await;
    let customer = app.register("Jane Doe", "jane@example.com").await;
    let base_url = serve(&app).await;

    let mut wizard = mounted_wizard(&app, service_id, "jane@example.com").await;
    assert_eq!(wizard.total_price(), 40.0);

    wizard.add_item(oven).unwrap();
    wizard.add_item(fridge).unwrap();
    assert_eq!(wizard.total_price(), 75.0);

    assert!(wizard.next());
    assert!(wizard.next());
    assert!(!wizard.next());
    assert_eq!(wizard.step(), WizardStep::ScheduleAndNotes);

    let tomorrow = (Utc::now().date_naive() + chrono::Duration::days(1)).format("%Y-%m-%d").to_string();
    fill_contact_and_schedule(&mut wizard, &tomorrow);

    let outcome = wizard.submit(&submitter(&app, &base_url, &customer)).await.unwrap();
    let receipt = match outcome {
        SubmitOutcome::Accepted(receipt) => receipt,
        other => panic!("expected acceptance, got {:?}", other),
    };
    assert_eq!(receipt.status, RequestStatus::Pending);
    assert_eq!(receipt.estimated_price, 75.0);

    // The wizard is back at the start with the mount-time draft.
    assert_eq!(wizard.step(), WizardStep::ServiceDetails);
    assert!(wizard.selection().is_empty());
    assert_eq!(wizard.draft().client_name, "Jane Doe");
    assert_eq!(wizard.draft().client_phone, "");

    let stored = app.state.request_repo.find_by_id(receipt.id).await.unwrap().unwrap();
    assert_eq!(stored.selected_additional_items, vec![oven, fridge]);
    assert_eq!(stored.city, "Springfield");
}

#[tokio::test]
async fn test_wizard_surfaces_backend_field_errors() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let service_id = app.create_service(&admin, json!({ "name": "Ironing", "base_price": 20.0 })).await;
    let customer = app.register("Jane Doe", "jane@example.com").await;
    let base_url = serve(&app).await;

    let mut wizard = mounted_wizard(&app, service_id, "jane@example.com").await;
    wizard.next();
    wizard.next();
    fill_contact_and_schedule(&mut wizard, "2000-01-01");
    wizard.set_field(DraftField::ClientPhone, "").unwrap();

    let outcome = wizard.submit(&submitter(&app, &base_url, &customer)).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Rejected);

    assert_eq!(wizard.error_for("preferred_date"), Some("Preferred date cannot be in the past."));
    assert_eq!(wizard.error_for("client_phone"), Some("Phone number is required."));
    assert_eq!(wizard.first_error_step(), Some(WizardStep::ContactInformation));

    // Nothing was lost and the wizard is usable again.
    assert_eq!(wizard.step(), WizardStep::ScheduleAndNotes);
    assert_eq!(wizard.draft().preferred_date, "2000-01-01");
    assert!(!wizard.is_processing());
    assert!(app.state.request_repo.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_keeps_draft() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let service_id = app.create_service(&admin, json!({ "name": "Ironing", "base_price": 20.0 })).await;
    let customer = app.register("Jane Doe", "jane@example.com").await;

    // Reserve a port, then close it so nothing is listening.
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let mut wizard = mounted_wizard(&app, service_id, "jane@example.com").await;
    wizard.next();
    wizard.next();
    fill_contact_and_schedule(&mut wizard, "2999-01-01");

    let outcome = wizard.submit(&submitter(&app, &format!("http://{}", closed), &customer)).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Failed);

    let message = wizard.submission_error().unwrap();
    assert!(message.contains("unreachable"), "got: {}", message);
    assert_eq!(wizard.draft().city, "Springfield");
    assert!(!wizard.is_processing());
}

#[tokio::test]
async fn test_expired_session_is_unexpected_response() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let service_id = app.create_service(&admin, json!({ "name": "Ironing", "base_price": 20.0 })).await;
    app.register("Jane Doe", "jane@example.com").await;
    let base_url = serve(&app).await;

    let bogus = AuthHeaders {
        access_token: "not-a-jwt".to_string(),
        csrf_token: "nope".to_string(),
    };

    let mut wizard = mounted_wizard(&app, service_id, "jane@example.com").await;
    wizard.next();
    wizard.next();
    fill_contact_and_schedule(&mut wizard, "2999-01-01");

    let outcome = wizard.submit(&submitter(&app, &base_url, &bogus)).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Failed);
    assert!(wizard.submission_error().unwrap().contains("401"));
}

/// Accepts one connection, reads the whole request, then answers 500 with a
/// body shorter than its declared length and hangs up.
async fn truncated_error_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_lowercase();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let declared = text[..head_end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + declared {
                    break;
                }
            }
        }
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_unreadable_error_body_is_still_unexpected() {
    let base_url = truncated_error_server().await;
    let submitter = HttpRequestSubmitter::new(base_url, "token", "csrf", Duration::from_secs(5)).unwrap();

    let form = ServiceRequestForm { service_id: 1, ..Default::default() };
    match submitter.submit(&form).await {
        Err(SubmissionError::Unexpected { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.is_empty());
        }
        other => panic!("expected an unexpected-response error, got {:?}", other),
    }
}
