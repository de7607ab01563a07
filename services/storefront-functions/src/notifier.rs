// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Operator notification for accepted contact submissions.
//!
//! Every user-supplied string is HTML-escaped before it is placed in the
//! message body or subject.

use crate::config::MailConfig;
use crate::submission::ContactSubmission;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail API key is not configured")]
    NotConfigured,

    #[error("mail request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail provider rejected message with HTTP {status}")]
    Rejected { status: u16 },
}

/// A composed message, ready for the provider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers composed messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Resend transactional email client.
pub struct ResendMailer {
    api_key: Option<String>,
    api_url: String,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(config: &MailConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &MailConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            client,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let api_key = self.api_key.as_deref().ok_or(MailError::NotConfigured)?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), detail = %detail, "Resend API error");
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

/// Composes and sends the operator notification.
pub struct Notifier {
    config: MailConfig,
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(config: MailConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self { config, mailer }
    }

    /// Build the operator email for a submission.
    pub fn compose(&self, submission: &ContactSubmission, received_at: DateTime<Utc>) -> OutboundEmail {
        let name = escape_html(&submission.name);
        let email = escape_html(&submission.email);
        let subject = escape_html(&submission.subject);
        let message = escape_html(&submission.message);

        let html = format!(
            r#"<div style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #333; border-bottom: 2px solid #eee; padding-bottom: 10px;">New Contact Form Submission</h2>
  <div style="margin: 20px 0;">
    <p style="margin: 8px 0;"><strong>Name:</strong> {name}</p>
    <p style="margin: 8px 0;"><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
    <p style="margin: 8px 0;"><strong>Subject:</strong> {subject}</p>
  </div>
  <div style="background: #f9f9f9; padding: 15px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0; color: #555;">Message:</h3>
    <p style="white-space: pre-wrap; color: #333;">{message}</p>
  </div>
  <p style="color: #888; font-size: 12px; margin-top: 30px; border-top: 1px solid #eee; padding-top: 15px;">
    This email was sent from the Blacklabspotsshop contact form on {received}.
  </p>
</div>"#,
            received = received_at.format("%Y-%m-%d %H:%M UTC"),
        );

        OutboundEmail {
            from: self.config.from.clone(),
            to: self.config.to.clone(),
            reply_to: submission.email.clone(),
            subject: format!("{} {}", self.config.subject_prefix, subject),
            html,
        }
    }

    /// Compose and deliver the notification for `submission`.
    pub async fn notify(&self, submission: &ContactSubmission) -> Result<(), MailError> {
        let email = self.compose(submission, Utc::now());
        self.mailer.send(&email).await?;
        info!(recipients = email.to.len(), "Contact email sent to operator");
        Ok(())
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
