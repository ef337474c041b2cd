use serde::Deserialize;
use std::time::Duration;

/// Active mail transport, selected once at startup via `MAIL_PROVIDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    Resend,
    Brevo,
}

impl MailProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailProvider::Resend => "resend",
            MailProvider::Brevo => "brevo",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_provider: MailProvider,
    pub mail_api_key: String,
    pub email_from: String,
    pub email_to: String,
    /// Upper bound on a single notification attempt, in seconds.
    pub notify_timeout_secs: u64,
    /// Bearer token guarding the purge and diagnostics endpoints. Optional:
    /// without it those endpoints answer 500 rather than running unguarded.
    pub admin_token: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mail_provider = match std::env::var("MAIL_PROVIDER")
            .unwrap_or_else(|_| "resend".to_string())
            .to_lowercase()
            .as_str()
        {
            "resend" => MailProvider::Resend,
            "brevo" => MailProvider::Brevo,
            other => anyhow::bail!("MAIL_PROVIDER must be 'resend' or 'brevo', got '{}'", other),
        };

        let key_var = match mail_provider {
            MailProvider::Resend => "RESEND_API_KEY",
            MailProvider::Brevo => "BREVO_API_KEY",
        };

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            mail_provider,
            mail_api_key: std::env::var(key_var)
                .or_else(|_| std::env::var("MAIL_API_KEY"))
                .map_err(|_| {
                    anyhow::anyhow!("{} or MAIL_API_KEY environment variable required", key_var)
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("{} cannot be empty", key_var);
                    }
                    Ok(key)
                })?,
            email_from: std::env::var("EMAIL_FROM")
                .map_err(|_| anyhow::anyhow!("EMAIL_FROM environment variable required"))
                .and_then(|from| {
                    if from.trim().is_empty() {
                        anyhow::bail!("EMAIL_FROM cannot be empty");
                    }
                    Ok(from)
                })?,
            email_to: std::env::var("EMAIL_TO")
                .map_err(|_| anyhow::anyhow!("EMAIL_TO environment variable required"))
                .and_then(|to| {
                    if to.trim().is_empty() {
                        anyhow::bail!("EMAIL_TO cannot be empty");
                    }
                    Ok(to)
                })?,
            notify_timeout_secs: std::env::var("NOTIFY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_TIMEOUT_SECS must be a positive number"))?,
            admin_token: std::env::var("ADMIN_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Mail provider: {}", config.mail_provider.as_str());
        tracing::debug!("Notification recipient: {}", config.email_to);
        if config.admin_token.is_none() {
            tracing::warn!("ADMIN_TOKEN not set; purge and diagnostics endpoints are disabled");
        }
        tracing::debug!("Allowed origins: {:?}", config.allowed_origins);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Caller-imposed bound on one notification attempt.
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs.max(1))
    }
}
