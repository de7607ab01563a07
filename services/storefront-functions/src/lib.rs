// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Storefront Functions
//!
//! Server-side handlers behind the Blacklabspotsshop storefront:
//!
//! - Contact form relay with honeypot and CAPTCHA spam checks
//! - Fixed-window rate limiting per client IP (5/hour) and per sender email (3/hour)
//! - HTML-escaped operator notification via a transactional email API
//! - Tee preview image generation proxy
//! - Birthday music generation proxy

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod media;
pub mod metrics;
pub mod notifier;
pub mod spam;
pub mod submission;
pub mod validator;

pub use config::Config;
pub use error::ContactError;
pub use handlers::{router, AppState, Providers};
pub use limiter::{CounterStore, MemoryStore, RateLimitResult, RateLimiter};
pub use submission::ContactSubmission;
pub use validator::{ContactValidator, ValidationError};
