// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Anti-abuse checks for contact submissions.
//!
//! The honeypot check lives on [`ContactSubmission`](crate::submission::ContactSubmission);
//! this module owns CAPTCHA verification. Every way a token can fail collapses
//! into [`SpamRejection::VerificationFailed`] so bots learn nothing from the
//! response. The underlying cause is only logged.

use crate::config::CaptchaConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("CAPTCHA secret is not configured")]
    NotConfigured,

    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("verification service returned HTTP {0}")]
    Status(u16),
}

/// Why a submission was turned away by the spam gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamRejection {
    /// No token was supplied
    VerificationRequired,
    /// Token rejected, or the verifier could not be reached
    VerificationFailed,
}

/// Verifies a client CAPTCHA token.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: &str) -> Result<bool, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Cloudflare Turnstile `siteverify` client.
pub struct TurnstileVerifier {
    secret_key: Option<String>,
    verify_url: String,
    client: reqwest::Client,
}

impl TurnstileVerifier {
    pub fn new(config: &CaptchaConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &CaptchaConfig, client: reqwest::Client) -> Self {
        Self {
            secret_key: config.secret_key.clone(),
            verify_url: config.verify_url.clone(),
            client,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: &str) -> Result<bool, VerifyError> {
        let secret = self.secret_key.as_deref().ok_or(VerifyError::NotConfigured)?;

        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token), ("remoteip", remote_ip)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VerifyError::Status(response.status().as_u16()));
        }

        let body: SiteVerifyResponse = response.json().await?;
        if !body.success {
            warn!(error_codes = ?body.error_codes, "Turnstile rejected token");
        }
        Ok(body.success)
    }
}

/// CAPTCHA gate in front of the validator.
pub struct SpamGate {
    verifier: Arc<dyn CaptchaVerifier>,
}

impl SpamGate {
    pub fn new(verifier: Arc<dyn CaptchaVerifier>) -> Self {
        Self { verifier }
    }

    /// Check the client's token. An empty token counts as missing.
    pub async fn check_token(
        &self,
        token: Option<&str>,
        remote_ip: &str,
    ) -> Result<(), SpamRejection> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(SpamRejection::VerificationRequired),
        };

        match self.verifier.verify(token, remote_ip).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(ip = %remote_ip, "Invalid CAPTCHA token");
                Err(SpamRejection::VerificationFailed)
            }
            Err(err) => {
                error!(ip = %remote_ip, error = %err, "CAPTCHA verification error");
                Err(SpamRejection::VerificationFailed)
            }
        }
    }
}
