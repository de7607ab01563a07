// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A contact form submission as posted by the storefront.
///
/// Decoding only fails on broken JSON. A text field that is missing, null or
/// not a string decodes as an empty string and is rejected by the validator
/// with a field-specific message, so a filled honeypot is always seen first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub subject: String,
    #[serde(default, deserialize_with = "text")]
    pub message: String,
    /// Hidden field; humans leave it empty.
    #[serde(default, deserialize_with = "honeypot")]
    pub honeypot: Option<String>,
    /// CAPTCHA response token.
    #[serde(default, deserialize_with = "token")]
    pub verification_token: Option<String>,
    /// Older clients send the token under this name.
    #[serde(default, deserialize_with = "token")]
    pub turnstile_token: Option<String>,
}

impl ContactSubmission {
    pub fn honeypot_filled(&self) -> bool {
        self.honeypot.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// The CAPTCHA token, preferring `verificationToken` when both are sent.
    pub fn token(&self) -> Option<&str> {
        [&self.verification_token, &self.turnstile_token]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .find(|t| !t.is_empty())
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

// Any truthy value counts: bots fill hidden inputs with whatever they like.
fn honeypot<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    })
}
