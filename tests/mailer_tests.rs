/// Integration tests for the mail transports with a mocked vendor API
/// Verifies wire format, auth headers, and failure mapping for both providers
/// without hitting real external services.
use lead_capture_api::config::{Config, MailProvider};
use lead_capture_api::errors::AppError;
use lead_capture_api::mailer::{render_text_body, LeadNotifier, MailNotifier};
use lead_capture_api::models::{LeadKind, LeadSubmission};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(provider: MailProvider) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 8080,
        mail_provider: provider,
        mail_api_key: "test_key".to_string(),
        email_from: "alerts@example.com".to_string(),
        email_to: "sales@example.com".to_string(),
        notify_timeout_secs: 5,
        admin_token: Some("test_admin_token".to_string()),
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}

fn sample_lead() -> lead_capture_api::models::Lead {
    LeadSubmission {
        name: Some("Jane".to_string()),
        phone: Some("555-0100".to_string()),
        email: Some("jane@acmecorp.com".to_string()),
        company: Some("Acme Corp".to_string()),
        ..Default::default()
    }
    .into_lead(LeadKind::B2B)
}

#[tokio::test]
async fn resend_transport_posts_with_bearer_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer test_key"))
        .and(body_partial_json(json!({
            "from": "alerts@example.com",
            "to": ["sales@example.com"],
            "subject": "New B2B Profile Verification Lead",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email_123" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier =
        MailNotifier::new(&create_test_config(MailProvider::Resend))
            .unwrap()
            .with_base_url(mock_server.uri());

    let result = notifier.send(LeadKind::B2B, &sample_lead()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn brevo_transport_posts_with_api_key_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/smtp/email"))
        .and(header("api-key", "test_key"))
        .and(body_partial_json(json!({
            "sender": { "email": "alerts@example.com" },
            "to": [{ "email": "sales@example.com" }],
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "messageId": "msg_123" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = MailNotifier::new(&create_test_config(MailProvider::Brevo))
        .unwrap()
        .with_base_url(mock_server.uri());

    let result = notifier.send(LeadKind::B2C, &sample_lead()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn provider_error_surfaces_as_notify_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "invalid api key" })),
        )
        .mount(&mock_server)
        .await;

    let notifier = MailNotifier::new(&create_test_config(MailProvider::Resend))
        .unwrap()
        .with_base_url(mock_server.uri());

    let err = notifier
        .send(LeadKind::B2B, &sample_lead())
        .await
        .unwrap_err();

    match err {
        AppError::Notify(msg) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("resend"));
        }
        other => panic!("expected notify error, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_endpoint_surfaces_as_notify_failure() {
    // A server that is started and dropped leaves a port with no listener.
    let uri = {
        let mock_server = MockServer::start().await;
        mock_server.uri()
    };

    let notifier = MailNotifier::new(&create_test_config(MailProvider::Resend))
        .unwrap()
        .with_base_url(uri);

    let err = notifier
        .send(LeadKind::B2B, &sample_lead())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Notify(_)));
}

#[test]
fn rendered_message_contains_lead_attributes() {
    let body = render_text_body(LeadKind::B2B, &sample_lead());
    assert!(body.contains("Jane"));
    assert!(body.contains("acmecorp.com"));
    assert!(body.contains("Acme Corp"));
    assert!(body.contains("555-0100"));
}

#[tokio::test]
async fn concurrent_notifications_all_dispatch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email_123" })))
        .expect(10)
        .mount(&mock_server)
        .await;

    let notifier = MailNotifier::new(&create_test_config(MailProvider::Resend))
        .unwrap()
        .with_base_url(mock_server.uri());

    let mut handles = vec![];
    for _ in 0..10 {
        let notifier = notifier.clone();
        handles.push(tokio::spawn(async move {
            notifier.send(LeadKind::B2B, &sample_lead()).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}
