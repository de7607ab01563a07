// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy for the contact endpoint.
//!
//! `Display` carries the detail for server logs. What the client sees comes
//! from [`ContactError::public_message`], which never includes provider or
//! store internals and does not reveal which rate-limit key tripped.

use crate::handlers::ContactReply;
use crate::limiter::{RateLimitReason, StoreError};
use crate::notifier::MailError;
use crate::spam::SpamRejection;
use crate::validator::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub const MALFORMED_BODY: &str = "Invalid request body.";
pub const VERIFICATION_REQUIRED: &str = "Verification required. Please complete the CAPTCHA.";
pub const VERIFICATION_FAILED: &str = "Verification failed. Please try again.";
pub const TOO_MANY_REQUESTS: &str = "Too many requests. Please try again later.";
pub const SEND_FAILED: &str = "Unable to send message. Please try again later.";

/// Terminal failure of a contact submission.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationError),

    #[error("verification token missing")]
    VerificationRequired,

    #[error("verification token rejected")]
    VerificationFailed,

    #[error("{0}")]
    RateLimited(RateLimitReason),

    #[error("delivery failed: {0}")]
    Delivery(#[from] MailError),

    #[error("rate limit store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<SpamRejection> for ContactError {
    fn from(rejection: SpamRejection) -> Self {
        match rejection {
            SpamRejection::VerificationRequired => ContactError::VerificationRequired,
            SpamRejection::VerificationFailed => ContactError::VerificationFailed,
        }
    }
}

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            ContactError::MalformedBody(_)
            | ContactError::Invalid(_)
            | ContactError::VerificationRequired
            | ContactError::VerificationFailed => StatusCode::BAD_REQUEST,
            ContactError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ContactError::Delivery(_) | ContactError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the submitter.
    pub fn public_message(&self) -> String {
        match self {
            ContactError::MalformedBody(_) => MALFORMED_BODY.to_string(),
            ContactError::Invalid(err) => err.to_string(),
            ContactError::VerificationRequired => VERIFICATION_REQUIRED.to_string(),
            ContactError::VerificationFailed => VERIFICATION_FAILED.to_string(),
            ContactError::RateLimited(_) => TOO_MANY_REQUESTS.to_string(),
            ContactError::Delivery(_) | ContactError::Store(_) => SEND_FAILED.to_string(),
        }
    }

    /// Metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            ContactError::MalformedBody(_) | ContactError::Invalid(_) => "invalid",
            ContactError::VerificationRequired | ContactError::VerificationFailed => {
                "verification_failed"
            }
            ContactError::RateLimited(_) => "rate_limited",
            ContactError::Delivery(_) | ContactError::Store(_) => "delivery_failed",
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        (self.status(), Json(ContactReply::failure(self.public_message()))).into_response()
    }
}
