//! Outbound email.
//!
//! [`ResendMailer`] delivers through the Resend HTTP API; [`LogMailer`] only
//! logs and keeps the messages, for development and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
pub const DEFAULT_FROM: &str = "Bin Tally <onboarding@resend.dev>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    fn validate(&self) -> Result<(), MailError> {
        if self.to.trim().is_empty() || !self.to.contains('@') {
            return Err(MailError::InvalidMessage(format!(
                "invalid recipient '{}'",
                self.to
            )));
        }
        if self.subject.trim().is_empty() {
            return Err(MailError::InvalidMessage("subject is required".into()));
        }
        if self.html.trim().is_empty() {
            return Err(MailError::InvalidMessage("body is required".into()));
        }
        Ok(())
    }
}

/// Provider acknowledgement of a sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid email: {0}")]
    InvalidMessage(String),

    #[error("Email provider rejected the message (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Email transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError>;
}

/// Mailer backed by the Resend API.
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        message.validate()?;
        let body = ResendRequest {
            from: &self.from,
            to: [message.to.trim()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Resend rejected email to {}: {} {}", message.to, status, body);
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let receipt = response.json::<DeliveryReceipt>().await.unwrap_or_default();
        log::info!("Sent email '{}' to {}", message.subject, message.to);
        Ok(receipt)
    }
}

/// Mailer that logs messages instead of sending them.
#[derive(Clone, Default)]
pub struct LogMailer {
    sent: Arc<RwLock<Vec<EmailMessage>>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages "sent" so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().clone()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        message.validate()?;
        log::info!(
            "Email delivery disabled; would send '{}' to {}",
            message.subject,
            message.to
        );
        self.sent.write().push(message.clone());
        Ok(DeliveryReceipt { id: None })
    }
}

/// The invitation email for one recipient.
pub fn invitation_email(to: &str, form_title: &str, access_code: &str) -> EmailMessage {
    let html = format!(
        "<div style=\"font-family: sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1>You've been invited to complete a bin tally form</h1>\
         <p>You have been invited to complete the form: <strong>{title}</strong></p>\
         <p>Your access code is:</p>\
         <p style=\"font-size: 24px; font-weight: bold; letter-spacing: 4px;\">{code}</p>\
         <p>Visit the website and enter this code to begin.</p>\
         <p>Thank you!</p>\
         </div>",
        title = escape_html(form_title),
        code = escape_html(access_code),
    );
    EmailMessage {
        to: to.to_string(),
        subject: format!("Invitation to Bin Tally Form: {}", form_title),
        html,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
