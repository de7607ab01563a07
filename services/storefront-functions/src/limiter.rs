// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for the contact endpoint.
//!
//! Implements dual-key limiting:
//! 1. Per-IP (5 submissions per hour default), checked before the body is parsed
//! 2. Per-sender email (3 per hour default), checked after validation
//!
//! Each key has its own window, opened by the first request that finds no live
//! entry. Counters live behind [`CounterStore`]; the bundled [`MemoryStore`] is
//! process-local, so limits only hold for a single instance.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Reason for rate limiting
        reason: RateLimitReason,
        /// Time until the window for this key closes
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Reason for rate limiting. Logged only; clients see one generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitReason {
    /// Client IP exceeded its window limit
    IpRateExceeded,
    /// Sender email exceeded its window limit
    EmailRateExceeded,
}

impl std::fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IpRateExceeded => write!(f, "IP rate limit exceeded"),
            Self::EmailRateExceeded => write!(f, "Email rate limit exceeded"),
        }
    }
}

/// Counter state for one key.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: Instant,
}

/// Outcome of recording one request against a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Counted { remaining: u32, reset_in: Duration },
    Exhausted { retry_after: Duration },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    #[error("window of {0:?} cannot be represented")]
    WindowOutOfRange(Duration),
}

/// Storage for per-key window counters.
///
/// `hit` must check the window before touching the count and must apply the
/// increment atomically with that check.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn hit(&self, key: &str, limit: u32, window: Duration) -> Result<Hit, StoreError>;

    /// Drop entries whose window has closed. Returns how many were removed.
    async fn sweep(&self) -> usize;
}

/// In-process counter store.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, RateLimitEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of tracked keys, live or expired.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn hit(&self, key: &str, limit: u32, window: Duration) -> Result<Hit, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(entry) if now <= entry.window_reset_at => {
                let retry_after = entry.window_reset_at.saturating_duration_since(now);
                if entry.count >= limit {
                    return Ok(Hit::Exhausted { retry_after });
                }
                entry.count += 1;
                Ok(Hit::Counted {
                    remaining: limit - entry.count,
                    reset_in: retry_after,
                })
            }
            _ => {
                let window_reset_at = now
                    .checked_add(window)
                    .ok_or(StoreError::WindowOutOfRange(window))?;
                entries.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        window_reset_at,
                    },
                );
                Ok(Hit::Counted {
                    remaining: limit.saturating_sub(1),
                    reset_in: window,
                })
            }
        }
    }

    async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.window_reset_at);
        before - entries.len()
    }
}

/// Rate limiter for contact submissions.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Create a rate limiter over a fresh in-memory store.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a rate limiter over a caller-supplied store.
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn CounterStore>) -> Self {
        Self { config, store }
    }

    /// Check rate limit for a client IP.
    pub async fn check_ip(&self, ip: &str) -> Result<RateLimitResult, StoreError> {
        let key = ip_key(ip);
        self.check(&key, self.config.ip_limit, RateLimitReason::IpRateExceeded)
            .await
    }

    /// Check rate limit for a sender email. The address is normalized first.
    pub async fn check_email(&self, email: &str) -> Result<RateLimitResult, StoreError> {
        let key = email_key(email);
        self.check(&key, self.config.email_limit, RateLimitReason::EmailRateExceeded)
            .await
    }

    async fn check(
        &self,
        key: &str,
        limit: u32,
        reason: RateLimitReason,
    ) -> Result<RateLimitResult, StoreError> {
        let hit = self
            .store
            .hit(key, limit, self.config.window_duration())
            .await?;

        Ok(match hit {
            Hit::Counted {
                remaining,
                reset_in,
            } => RateLimitResult::Allowed {
                remaining,
                reset_in,
            },
            Hit::Exhausted { retry_after } => {
                debug!(key, ?retry_after, %reason, "Window exhausted");
                RateLimitResult::Limited {
                    reason,
                    retry_after,
                }
            }
        })
    }

    /// Clean up expired entries (should be called periodically).
    pub async fn cleanup(&self) -> usize {
        let removed = self.store.sweep().await;
        if removed > 0 {
            debug!(removed, "Swept expired rate limit entries");
        }
        removed
    }
}

/// Counter key for a client IP.
pub fn ip_key(ip: &str) -> String {
    format!("ip:{}", ip)
}

/// Counter key for a sender email, lower-cased and trimmed.
pub fn email_key(email: &str) -> String {
    format!("email:{}", email.trim().to_lowercase())
}
