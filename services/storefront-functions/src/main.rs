// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Storefront Functions Service
//!
//! Serves the storefront's server-side endpoints:
//!
//! - `POST /send-contact-email`: contact form relay (rate limited, CAPTCHA gated)
//! - `POST /generate-spot-tee-image`: AI tee preview proxy
//! - `POST /generate-birthday-music`: birthday audio proxy
//! - `GET /health`, `GET /metrics`
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is read
//! first when present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `IP_RATE_LIMIT`: Submissions per IP per window (default: 5)
//! - `EMAIL_RATE_LIMIT`: Submissions per sender email per window (default: 3)
//! - `RATE_WINDOW_SECS`: Window length (default: 3600)
//! - `RESEND_API_KEY`, `CONTACT_FROM`, `CONTACT_TO` (comma separated)
//! - `TURNSTILE_SECRET_KEY`
//! - `LOVABLE_API_KEY`, `ELEVENLABS_API_KEY`
//! - `OUTBOUND_TIMEOUT_SECS`: Timeout for provider calls (default: 10)
//! - `METRICS_ENABLED`: Serve `/metrics` (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_functions::{
    config::Config,
    handlers::{router, AppState, Providers},
    media::{ElevenLabsMusic, GatewayImageGenerator},
    notifier::ResendMailer,
    spam::TurnstileVerifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    // Load configuration
    let config = load_config();
    config.validate()?;
    info!(
        bind_addr = %config.bind_addr,
        ip_limit = config.rate_limit.ip_limit,
        email_limit = config.rate_limit.email_limit,
        window_secs = config.rate_limit.window_secs,
        "Starting storefront functions"
    );
    warn_missing_secrets(&config);

    // Create application state
    let timeout = config.outbound_timeout();
    let providers = Providers {
        captcha: Arc::new(TurnstileVerifier::new(&config.captcha, timeout)?),
        mailer: Arc::new(ResendMailer::new(&config.mail, timeout)?),
        images: Arc::new(GatewayImageGenerator::new(&config.media, timeout)?),
        music: Arc::new(ElevenLabsMusic::new(&config.media, timeout)?),
    };
    let state = Arc::new(AppState::new(config.clone(), providers)?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let sweep_every = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn warn_missing_secrets(config: &Config) {
    let secrets = [
        ("RESEND_API_KEY", config.mail.api_key.is_some()),
        ("TURNSTILE_SECRET_KEY", config.captcha.secret_key.is_some()),
        ("LOVABLE_API_KEY", config.media.image_api_key.is_some()),
        ("ELEVENLABS_API_KEY", config.media.music_api_key.is_some()),
    ];
    for (name, present) in secrets {
        if !present {
            warn!(secret = name, "Secret not configured; dependent endpoint will fail");
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let defaults = Config::default();

    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        outbound_timeout_secs: env_parse("OUTBOUND_TIMEOUT_SECS")
            .unwrap_or(defaults.outbound_timeout_secs),
        rate_limit: storefront_functions::config::RateLimitConfig {
            ip_limit: env_parse("IP_RATE_LIMIT").unwrap_or(defaults.rate_limit.ip_limit),
            email_limit: env_parse("EMAIL_RATE_LIMIT").unwrap_or(defaults.rate_limit.email_limit),
            window_secs: env_parse("RATE_WINDOW_SECS").unwrap_or(defaults.rate_limit.window_secs),
            ..defaults.rate_limit
        },
        mail: storefront_functions::config::MailConfig {
            api_key: env_secret("RESEND_API_KEY"),
            from: std::env::var("CONTACT_FROM").unwrap_or(defaults.mail.from),
            to: std::env::var("CONTACT_TO")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.mail.to),
            ..defaults.mail
        },
        captcha: storefront_functions::config::CaptchaConfig {
            secret_key: env_secret("TURNSTILE_SECRET_KEY"),
            ..defaults.captcha
        },
        media: storefront_functions::config::MediaConfig {
            image_api_key: env_secret("LOVABLE_API_KEY"),
            music_api_key: env_secret("ELEVENLABS_API_KEY"),
            ..defaults.media
        },
        metrics: storefront_functions::config::MetricsConfig {
            enabled: env_parse("METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
            ..defaults.metrics
        },
        ..defaults
    }
}
