use std::sync::Arc;

use serde::Serialize;

use crate::core::config::MailConfig;
use crate::core::error::{AppError, Result};

#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
}

/// Transactional email delivery over the mail provider's HTTP API.
///
/// Without an API key the service runs in no-op mode and only logs,
/// which is how local and test environments operate. Delivery problems
/// are never allowed to fail the request that triggered the email.
pub struct MailerService {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from_address: String,
    admin_address: String,
}

impl MailerService {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            admin_address: config.admin_address.clone(),
        }
    }

    pub fn admin_address(&self) -> &str {
        &self.admin_address
    }

    /// Deliver one email, waiting for the provider's answer.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::info!("Mail delivery disabled; skipping '{}' to {}", subject, to);
            return Ok(());
        };

        let payload = MailPayload {
            from: &self.from_address,
            to: vec![to],
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Mail provider request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Mail provider request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("Mail provider returned {}: {}", status, detail);
            return Err(AppError::ExternalServiceError(format!(
                "Mail provider returned {}",
                status
            )));
        }

        tracing::debug!("Sent '{}' to {}", subject, to);
        Ok(())
    }

    /// Deliver in the background. The caller's request never waits on
    /// or fails because of email.
    pub fn send_detached(self: &Arc<Self>, to: String, subject: String, body: String) {
        let mailer = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, &body).await {
                tracing::warn!("Failed to send '{}' to {}: {:?}", subject, to, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_mailer() -> MailerService {
        MailerService::new(&MailConfig {
            api_url: "http://localhost:9/v1/send".to_string(),
            api_key: None,
            from_address: "no-reply@mindwell.app".to_string(),
            admin_address: "admin@mindwell.app".to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_without_api_key_is_noop_ok() {
        let mailer = disabled_mailer();
        // The api_url is unreachable on purpose; no key means no request.
        let result = mailer.send("patient@example.com", "Hello", "body").await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_payload_shape() {
        let payload = MailPayload {
            from: "no-reply@mindwell.app",
            to: vec!["patient@example.com"],
            subject: "Appointment reminder",
            text: "See you tomorrow",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["from"], "no-reply@mindwell.app");
        assert_eq!(json["to"][0], "patient@example.com");
        assert_eq!(json["subject"], "Appointment reminder");
    }
}
