//! Email service for event announcements and status notifications.
//!
//! Supports two providers:
//! - `console`: logs emails (development)
//! - `sendgrid`: uses the SendGrid v3 mail API

use crate::config::EmailConfig;
use crate::middleware::metrics::record_email_sent;
use domain::services::NotificationContent;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

impl EmailMessage {
    pub fn from_notification(to: &str, to_name: &str, content: NotificationContent) -> Self {
        Self {
            to: to.to_string(),
            to_name: Some(to_name.to_string()),
            subject: content.subject,
            body_text: content.body_text,
            body_html: Some(content.body_html),
        }
    }
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Front-end origin for links in email bodies.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Send an email message. A disabled service drops the message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Send and log the outcome instead of returning it. Used for
    /// notifications whose failure must not fail the request.
    pub async fn deliver(&self, kind: &'static str, message: EmailMessage) {
        let to = message.to.clone();
        match self.send(message).await {
            Ok(()) => record_email_sent(kind, true),
            Err(e) => {
                record_email_sent(kind, false);
                warn!(to = %to, kind, error = %e, "Failed to send notification email");
            }
        }
    }

    fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body (plain text)");
        Ok(())
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = sendgrid_payload(&self.config, &message);

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

fn sendgrid_payload(config: &EmailConfig, message: &EmailMessage) -> serde_json::Value {
    let mut to = serde_json::json!({ "email": message.to });
    if let Some(name) = &message.to_name {
        to["name"] = serde_json::json!(name);
    }

    let mut content = vec![serde_json::json!({
        "type": "text/plain",
        "value": message.body_text
    })];
    if let Some(html) = &message.body_html {
        content.push(serde_json::json!({ "type": "text/html", "value": html }));
    }

    serde_json::json!({
        "personalizations": [{ "to": [to] }],
        "from": {
            "email": config.sender_email,
            "name": config.sender_name
        },
        "subject": message.subject,
        "content": content
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sender_email: "events@umib.net".to_string(),
            sender_name: "Campus Events".to_string(),
            base_url: "https://events.umib.net".to_string(),
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "student@umib.net".to_string(),
            to_name: Some("Student".to_string()),
            subject: "Registration confirmed".to_string(),
            body_text: "See you there".to_string(),
            body_html: Some("<p>See you there</p>".to_string()),
        }
    }

    #[tokio::test]
    async fn test_send_console_email() {
        let service = EmailService::new(test_config());
        assert!(service.send(message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_disabled_silently_succeeds() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config);
        assert!(!service.is_enabled());
        assert!(service.send(message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_is_not_configured() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);
        assert!(matches!(
            service.send(message()).await,
            Err(EmailError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let mut config = test_config();
        config.provider = "carrier-pigeon".to_string();
        let service = EmailService::new(config);
        assert!(service.send(message()).await.is_err());
    }

    #[test]
    fn test_sendgrid_payload_includes_html_part() {
        let payload = sendgrid_payload(&test_config(), &message());
        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "student@umib.net");
        assert_eq!(payload["from"]["name"], "Campus Events");
        assert_eq!(payload["content"].as_array().unwrap().len(), 2);
        assert_eq!(payload["content"][1]["type"], "text/html");
    }

    #[test]
    fn test_message_from_notification() {
        let content = NotificationContent {
            subject: "Subject".to_string(),
            body_text: "Text".to_string(),
            body_html: "<p>Text</p>".to_string(),
        };
        let message = EmailMessage::from_notification("a@umib.net", "A", content);
        assert_eq!(message.to_name.as_deref(), Some("A"));
        assert_eq!(message.body_html.as_deref(), Some("<p>Text</p>"));
    }
}
