/// Outbound email boundary
///
/// The auth flows send exactly two kinds of mail: a verification code during
/// registration and a reset code during password recovery. Delivery sits
/// behind the [`EmailSender`] trait so the API crate can run against a real
/// HTTP mail provider in production and a no-op sender in development and
/// tests.
///
/// Delivery is single-shot. A send failure surfaces as an error on the
/// triggering request; there is no queue and no retry.

use async_trait::async_trait;
use serde::Serialize;

/// Error type for email delivery
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Provider rejected the request or the transport failed
    #[error("Email delivery failed: {0}")]
    DeliveryFailed(String),

    /// Provider answered with a non-success status
    #[error("Email provider returned status {0}")]
    ProviderStatus(u16),
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    /// Recipient address (already normalized)
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,
}

impl EmailMessage {
    /// Builds the registration verification message
    pub fn verification(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify your BugTrail account".to_string(),
            body: format!(
                "Your BugTrail verification code is {code}. It expires in 10 minutes."
            ),
        }
    }

    /// Builds the password-reset message
    pub fn password_reset(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset your BugTrail password".to_string(),
            body: format!(
                "Your BugTrail password reset code is {code}. It expires in 10 minutes."
            ),
        }
    }
}

/// Contract for outbound email delivery
///
/// Implementations must be cheap to clone behind an `Arc` and safe to call
/// concurrently.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers a single message
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Sends mail through an HTTP JSON provider endpoint
///
/// POSTs the message as JSON to the configured URL with a bearer API key.
/// Any 2xx response counts as delivered.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct HttpMailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailSender for HttpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let payload = HttpMailPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::DeliveryFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmailError::ProviderStatus(response.status().as_u16()));
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "email delivered");
        Ok(())
    }
}

/// Sender that logs instead of delivering
///
/// Used when no provider is configured. The code is logged at debug level so
/// local flows can be completed by reading the server log.
pub struct NoopMailer;

#[async_trait]
impl EmailSender for NoopMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        tracing::debug!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "email suppressed (no provider configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_mailer_always_succeeds() {
        let mailer = NoopMailer;
        let message = EmailMessage::verification("dev@example.com", "123456");
        assert!(mailer.send(message).await.is_ok());
    }

    #[test]
    fn test_message_templates_carry_code() {
        let verification = EmailMessage::verification("a@example.com", "042917");
        assert!(verification.body.contains("042917"));
        assert_eq!(verification.to, "a@example.com");

        let reset = EmailMessage::password_reset("a@example.com", "654321");
        assert!(reset.body.contains("654321"));
        assert!(reset.subject.contains("Reset"));
    }
}
