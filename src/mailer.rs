use crate::config::{Config, MailProvider};
use crate::errors::AppError;
use crate::models::{Lead, LeadKind};
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Delivers a lead-capture alert. One attempt per call, no internal retry;
/// callers bound the attempt with their own timeout.
#[allow(async_fn_in_trait)]
pub trait LeadNotifier: Send + Sync {
    async fn send(&self, kind: LeadKind, lead: &Lead) -> Result<(), AppError>;
}

/// Email notifier dispatching through exactly one configured transactional
/// mail vendor. The rendered content is transport-independent; only the wire
/// format differs per provider.
#[derive(Clone)]
pub struct MailNotifier {
    client: Client,
    provider: MailProvider,
    base_url: String,
    api_key: String,
    from: String,
    to: String,
}

impl MailNotifier {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.notify_timeout_secs.max(1)))
            .build()
            .map_err(|e| AppError::Notify(format!("Failed to create mail client: {}", e)))?;

        let base_url = match config.mail_provider {
            MailProvider::Resend => "https://api.resend.com",
            MailProvider::Brevo => "https://api.brevo.com",
        }
        .to_string();

        Ok(Self {
            client,
            provider: config.mail_provider,
            base_url,
            api_key: config.mail_api_key.clone(),
            from: config.email_from.clone(),
            to: config.email_to.clone(),
        })
    }

    /// Points the transport at a different endpoint. Tests use this to target
    /// a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn provider(&self) -> MailProvider {
        self.provider
    }
}

impl LeadNotifier for MailNotifier {
    async fn send(&self, kind: LeadKind, lead: &Lead) -> Result<(), AppError> {
        let subject = render_subject(kind);
        let text = render_text_body(kind, lead);
        let html = render_html_body(kind, lead);

        let request = match self.provider {
            MailProvider::Resend => self
                .client
                .post(format!("{}/emails", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "from": self.from,
                    "to": [self.to],
                    "subject": subject,
                    "html": html,
                    "text": text,
                })),
            MailProvider::Brevo => self
                .client
                .post(format!("{}/v3/smtp/email", self.base_url))
                .header("api-key", self.api_key.as_str())
                .json(&json!({
                    "sender": { "email": self.from },
                    "to": [{ "email": self.to }],
                    "subject": subject,
                    "htmlContent": html,
                    "textContent": text,
                })),
        };

        let response = request.send().await.map_err(|e| {
            AppError::Notify(format!(
                "{} request failed: {}",
                self.provider.as_str(),
                e
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Notify(format!(
                "{} returned {}: {}",
                self.provider.as_str(),
                status,
                error_text
            )));
        }

        tracing::info!(
            "✓ Lead notification sent via {} for {} lead '{}'",
            self.provider.as_str(),
            kind,
            lead.name
        );
        Ok(())
    }
}

/// The fixed attribute set every notification renders, in display order.
fn field_rows(lead: &Lead) -> Vec<(&'static str, String)> {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    vec![
        ("name", lead.name.clone()),
        ("company", or_dash(&lead.company)),
        ("email", or_dash(&lead.email)),
        ("phone", lead.phone.clone()),
        ("service", or_dash(&lead.service)),
        ("source", lead.source.clone()),
        ("pagePath", or_dash(&lead.page_path)),
        ("utm_source", or_dash(&lead.utm_source)),
        ("utm_medium", or_dash(&lead.utm_medium)),
        ("utm_campaign", or_dash(&lead.utm_campaign)),
    ]
}

pub fn render_subject(kind: LeadKind) -> String {
    format!("New {} Lead", kind.type_label())
}

pub fn render_text_body(kind: LeadKind, lead: &Lead) -> String {
    let mut body = format!("New {} Lead\n\n", kind.type_label());
    for (label, value) in field_rows(lead) {
        body.push_str(&format!("{}: {}\n", label, value));
    }
    body.push_str(&format!("time: {}\n", Utc::now().to_rfc3339()));
    if let Some(id) = lead.id {
        body.push_str(&format!("lead id: {}\n", id));
    }
    body
}

pub fn render_html_body(kind: LeadKind, lead: &Lead) -> String {
    let mut rows = String::new();
    for (label, value) in field_rows(lead) {
        rows.push_str(&format!(
            r#"<div class="row"><span class="label">{}:</span> {}</div>"#,
            label, value
        ));
    }
    rows.push_str(&format!(
        r#"<div class="row"><span class="label">Time:</span> {}</div>"#,
        Utc::now().to_rfc3339()
    ));
    if let Some(id) = lead.id {
        rows.push_str(&format!(
            r#"<div class="row"><span class="label">Lead ID:</span> <code>{}</code></div>"#,
            id
        ));
    }

    format!(
        r#"<html>
  <head>
    <style>
      body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
      .container {{ max-width: 640px; margin: 0 auto; padding: 20px; }}
      .header {{ background-color: #f4f4f4; padding: 16px; border-radius: 6px; }}
      .row {{ margin-bottom: 8px; }}
      .label {{ font-weight: 600; color: #555; display: inline-block; width: 140px; }}
      code {{ background: #f6f8fa; padding: 2px 4px; border-radius: 4px; }}
    </style>
  </head>
  <body>
    <div class="container">
      <div class="header"><h2>New {} Lead</h2></div>
      <div class="grid">{}</div>
    </div>
  </body>
</html>"#,
        kind.type_label(),
        rows
    )
}
