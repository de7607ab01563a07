// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the storefront functions service.
//!
//! Provider secrets are optional at startup. A missing secret surfaces as a
//! per-request failure on the endpoint that needs it, so the contact form keeps
//! working even when, say, the music key is absent.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Longest accepted rate window (one year).
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// Paths served by fixed routes; the metrics path may not shadow them.
pub const RESERVED_PATHS: &[&str] = &[
    "/health",
    "/healthz",
    "/send-contact-email",
    "/generate-spot-tee-image",
    "/generate-birthday-music",
];

/// Configuration for the storefront functions service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Upper bound on every outbound provider call, in seconds (default: 10)
    #[serde(default = "default_outbound_timeout_secs")]
    pub outbound_timeout_secs: u64,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Contact submission bounds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Transactional email configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// CAPTCHA verification configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// AI image and music provider configuration
    #[serde(default)]
    pub media: MediaConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limits for the contact endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per client IP per window (default: 5)
    #[serde(default = "default_ip_limit")]
    pub ip_limit: u32,

    /// Maximum submissions per sender email per window (default: 3)
    #[serde(default = "default_email_limit")]
    pub email_limit: u32,

    /// Window length in seconds, shared by both key kinds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often expired entries are swept, in seconds (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Length bounds for contact submissions, counted in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_max")]
    pub name_max: usize,

    #[serde(default = "default_subject_max")]
    pub subject_max: usize,

    #[serde(default = "default_message_min")]
    pub message_min: usize,

    #[serde(default = "default_message_max")]
    pub message_max: usize,
}

/// Transactional email provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Resend API key; sending fails with a generic error when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Resend API base URL
    #[serde(default = "default_resend_url")]
    pub api_url: String,

    /// Sender identity
    #[serde(default = "default_from")]
    pub from: String,

    /// Site operator inbox(es)
    #[serde(default = "default_to")]
    pub to: Vec<String>,

    /// Prepended to the submitter's subject
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

/// Cloudflare Turnstile settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Turnstile secret; every token fails verification when unset
    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default = "default_turnstile_url")]
    pub verify_url: String,
}

/// AI image gateway and music API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default)]
    pub image_api_key: Option<String>,

    #[serde(default = "default_image_gateway_url")]
    pub image_gateway_url: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default)]
    pub music_api_key: Option<String>,

    #[serde(default = "default_music_api_url")]
    pub music_api_url: String,

    /// Length of the generated clip in seconds (default: 30)
    #[serde(default = "default_music_duration_secs")]
    pub music_duration_secs: u32,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_outbound_timeout_secs() -> u64 {
    10
}

fn default_ip_limit() -> u32 {
    5
}

fn default_email_limit() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_name_max() -> usize {
    100
}

fn default_subject_max() -> usize {
    200
}

fn default_message_min() -> usize {
    10
}

fn default_message_max() -> usize {
    1000
}

fn default_resend_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_from() -> String {
    "Blacklabspotsshop <onboarding@resend.dev>".to_string()
}

fn default_to() -> Vec<String> {
    vec!["hitlijsten_demping_7b@icloud.com".to_string()]
}

fn default_subject_prefix() -> String {
    "[Contact Form]".to_string()
}

fn default_turnstile_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

fn default_image_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}

fn default_image_model() -> String {
    "google/gemini-2.5-flash-image-preview".to_string()
}

fn default_music_api_url() -> String {
    "https://api.elevenlabs.io/v1/music".to_string()
}

fn default_music_duration_secs() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            outbound_timeout_secs: default_outbound_timeout_secs(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            mail: MailConfig::default(),
            captcha: CaptchaConfig::default(),
            media: MediaConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ip_limit: default_ip_limit(),
            email_limit: default_email_limit(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_max: default_name_max(),
            subject_max: default_subject_max(),
            message_min: default_message_min(),
            message_max: default_message_max(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_resend_url(),
            from: default_from(),
            to: default_to(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            verify_url: default_turnstile_url(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            image_api_key: None,
            image_gateway_url: default_image_gateway_url(),
            image_model: default_image_model(),
            music_api_key: None,
            music_api_url: default_music_api_url(),
            music_duration_secs: default_music_duration_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

/// Configuration that cannot be served.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("mail recipient list is empty")]
    NoRecipients,

    #[error("metrics path must start with '/': {0}")]
    InvalidMetricsPath(String),

    #[error("metrics path {0} is already routed")]
    MetricsPathTaken(String),

    #[error("rate window must be between 1 and {max} seconds, got {0}", max = MAX_WINDOW_SECS)]
    InvalidWindow(u64),

    #[error("sweep interval must be at least 1 second")]
    InvalidSweepInterval,
}

impl Config {
    /// Check endpoints, recipients, routes and windows before the server starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("mail.api_url", &self.mail.api_url),
            ("captcha.verify_url", &self.captcha.verify_url),
            ("media.image_gateway_url", &self.media.image_gateway_url),
            ("media.music_api_url", &self.media.music_api_url),
        ];
        for (field, value) in endpoints {
            Url::parse(value).map_err(|source| ConfigError::InvalidUrl { field, source })?;
        }
        if self.mail.to.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        if !self.metrics.path.starts_with('/') {
            return Err(ConfigError::InvalidMetricsPath(self.metrics.path.clone()));
        }
        if RESERVED_PATHS.contains(&self.metrics.path.as_str()) {
            return Err(ConfigError::MetricsPathTaken(self.metrics.path.clone()));
        }
        let window = self.rate_limit.window_secs;
        if window == 0 || window > MAX_WINDOW_SECS {
            return Err(ConfigError::InvalidWindow(window));
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidSweepInterval);
        }
        Ok(())
    }

    /// Get the outbound call timeout
    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
