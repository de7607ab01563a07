// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission validator.
//!
//! Checks shape only:
//! - name, subject and message lengths (in characters)
//! - email against a simple `local@domain.tld` pattern
//!
//! Nothing is sanitized here; escaping happens when the email is composed.

use crate::config::ValidationConfig;
use crate::submission::ContactSubmission;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Validation error types. `Display` is the message shown to the submitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please provide a valid name.")]
    InvalidName,

    #[error("Please provide a valid email address.")]
    InvalidEmail,

    #[error("Please provide a valid subject.")]
    InvalidSubject,

    #[error("Message must be between {min} and {max} characters.")]
    InvalidMessage { min: usize, max: usize },
}

/// Contact submission validator.
pub struct ContactValidator {
    config: ValidationConfig,
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a submission. The first failing field wins, in form order.
    pub fn validate(&self, submission: &ContactSubmission) -> Result<(), ValidationError> {
        if !within(&submission.name, 1, self.config.name_max) {
            debug!(len = submission.name.chars().count(), "Name out of bounds");
            return Err(ValidationError::InvalidName);
        }

        if !is_valid_email(&submission.email) {
            debug!("Email failed pattern check");
            return Err(ValidationError::InvalidEmail);
        }

        if !within(&submission.subject, 1, self.config.subject_max) {
            debug!(len = submission.subject.chars().count(), "Subject out of bounds");
            return Err(ValidationError::InvalidSubject);
        }

        if !within(
            &submission.message,
            self.config.message_min,
            self.config.message_max,
        ) {
            debug!(len = submission.message.chars().count(), "Message out of bounds");
            return Err(ValidationError::InvalidMessage {
                min: self.config.message_min,
                max: self.config.message_max,
            });
        }

        Ok(())
    }
}

fn within(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

/// Basic RFC-shaped address check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
