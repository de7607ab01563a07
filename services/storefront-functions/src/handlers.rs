// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the storefront functions service.
//!
//! The contact handler runs a fixed pipeline and stops at the first failing
//! step:
//!
//! IP rate limit → parse → honeypot → CAPTCHA → validate → email rate limit → send
//!
//! The IP check runs before the body is parsed, and the email check runs
//! only after validation, so malformed submissions never consume the email
//! quota.

use crate::config::Config;
use crate::error::ContactError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::media::{self, ImageGenerator, MediaError, MusicGenerator, TeeImageRequest};
use crate::metrics::Metrics;
use crate::notifier::{Mailer, Notifier};
use crate::spam::{CaptchaVerifier, SpamGate};
use crate::submission::ContactSubmission;
use crate::validator::ContactValidator;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Request headers the storefront client may send cross-origin.
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type, x-supabase-client-platform, x-supabase-client-platform-version, x-supabase-client-runtime, x-supabase-client-runtime-version";

/// Outbound provider clients.
pub struct Providers {
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageGenerator>,
    pub music: Arc<dyn MusicGenerator>,
}

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub spam_gate: SpamGate,
    pub validator: ContactValidator,
    pub notifier: Notifier,
    pub images: Arc<dyn ImageGenerator>,
    pub music: Arc<dyn MusicGenerator>,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    /// Wire state from configuration, with an in-memory rate limiter.
    pub fn new(config: Config, providers: Providers) -> Result<Self, prometheus::Error> {
        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            spam_gate: SpamGate::new(providers.captcha),
            validator: ContactValidator::new(config.validation.clone()),
            notifier: Notifier::new(config.mail.clone(), providers.mailer),
            images: providers.images,
            music: providers.music,
            metrics: Metrics::new()?,
            config,
        })
    }

    /// Replace the rate limiter, e.g. with one backed by a shared store.
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }
}

/// JSON body of every contact endpoint reply.
#[derive(Debug, Serialize)]
pub struct ContactReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContactReply {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: Some("Email sent successfully"),
            error: None,
        }
    }

    /// Reply for honeypot hits; indistinguishable from an ordinary success
    /// without a message.
    pub fn silent() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

/// Media endpoint error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// How an accepted contact request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactOutcome {
    Sent,
    Honeypot,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route(
            "/send-contact-email",
            post(send_contact_email).options(preflight),
        )
        .route(
            "/generate-spot-tee-image",
            post(generate_tee_image).options(preflight),
        )
        .route(
            "/generate-birthday-music",
            post(generate_birthday_music).options(preflight),
        );

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let headers: Vec<HeaderName> = ALLOWED_HEADERS
        .split(", ")
        .map(HeaderName::from_static)
        .collect();

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(headers)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "storefront-functions",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Answer CORS preflight requests that reach the router with an empty body.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, OPTIONS"),
            ),
        ],
    )
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Resolve the caller's address: proxy headers first, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    if let Some(ip) = headers
        .get("cf-connecting-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Contact form endpoint.
pub async fn send_contact_email(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    debug!(ip = %ip, bytes = body.len(), "Processing contact submission");

    match process_contact(&state, &ip, &body).await {
        Ok(ContactOutcome::Sent) => {
            state.metrics.record_contact("sent");
            (StatusCode::OK, Json(ContactReply::sent())).into_response()
        }
        Ok(ContactOutcome::Honeypot) => {
            state.metrics.record_contact("honeypot");
            (StatusCode::OK, Json(ContactReply::silent())).into_response()
        }
        Err(err) => {
            if err.is_internal() {
                error!(ip = %ip, error = %err, "Error in contact handler");
            } else {
                info!(ip = %ip, error = %err, "Contact submission rejected");
            }
            state.metrics.record_contact(err.outcome());
            err.into_response()
        }
    }
}

async fn process_contact(
    state: &AppState,
    ip: &str,
    body: &[u8],
) -> Result<ContactOutcome, ContactError> {
    if let RateLimitResult::Limited {
        reason,
        retry_after,
    } = state.limiter.check_ip(ip).await?
    {
        warn!(ip = %ip, retry_after_secs = retry_after.as_secs(), "Rate limit exceeded for IP");
        return Err(ContactError::RateLimited(reason));
    }

    let submission: ContactSubmission = serde_json::from_slice(body)?;

    if submission.honeypot_filled() {
        info!(ip = %ip, "Honeypot triggered - spam detected");
        return Ok(ContactOutcome::Honeypot);
    }

    state
        .spam_gate
        .check_token(submission.token(), ip)
        .await?;

    state.validator.validate(&submission)?;

    if let RateLimitResult::Limited {
        reason,
        retry_after,
    } = state.limiter.check_email(&submission.email).await?
    {
        warn!(
            email = %submission.normalized_email(),
            retry_after_secs = retry_after.as_secs(),
            "Rate limit exceeded for email"
        );
        return Err(ContactError::RateLimited(reason));
    }

    state.notifier.notify(&submission).await?;
    Ok(ContactOutcome::Sent)
}

/// Tee preview endpoint.
pub async fn generate_tee_image(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let result = match serde_json::from_slice::<TeeImageRequest>(&body) {
        Ok(request) => media::render_tee_preview(state.images.as_ref(), &request).await,
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(preview) => {
            state.metrics.record_media("tee_image", "ok");
            (StatusCode::OK, Json(preview)).into_response()
        }
        Err(err) => {
            let (status, message) = tee_image_failure(&err);
            if status.is_server_error() {
                error!(error = %err, "Error in tee image generation");
            } else {
                info!(error = %err, "Tee image request rejected");
            }
            state.metrics.record_media("tee_image", "failed");
            (status, Json(ErrorResponse { error: message })).into_response()
        }
    }
}

fn tee_image_failure(err: &MediaError) -> (StatusCode, &'static str) {
    match err {
        MediaError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "Invalid request body."),
        MediaError::MissingImage => (StatusCode::BAD_REQUEST, "User image is required"),
        MediaError::UpstreamRateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
        ),
        MediaError::UpstreamPaymentRequired => (
            StatusCode::PAYMENT_REQUIRED,
            "Service temporarily unavailable. Please try again later.",
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate image"),
    }
}

/// Birthday music endpoint.
pub async fn generate_birthday_music(State(state): State<Arc<AppState>>) -> Response {
    match state.music.generate().await {
        Ok(audio) => {
            state.metrics.record_media("birthday_music", "ok");
            ([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response()
        }
        Err(err) => {
            error!(error = %err, "Error generating birthday music");
            state.metrics.record_media("birthday_music", "failed");
            let message = match err {
                MediaError::NotConfigured(_) => "Music generation is not configured",
                _ => "Failed to generate music",
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: message }),
            )
                .into_response()
        }
    }
}
