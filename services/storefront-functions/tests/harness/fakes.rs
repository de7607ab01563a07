// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-process stand-ins for the outbound providers.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storefront_functions::{
    clock::ManualClock,
    config::Config,
    handlers::{router, AppState, Providers},
    limiter::{MemoryStore, RateLimiter},
    media::{GeneratedImage, ImageGenerator, MediaError, MusicGenerator},
    notifier::{MailError, Mailer, OutboundEmail},
    spam::{CaptchaVerifier, VerifyError},
};
use tower::ServiceExt;

/// Token the fake verifier rejects.
pub const FORGED_TOKEN: &str = "forged";
/// Token that makes the fake verifier fail as if the network were down.
pub const UNREACHABLE_TOKEN: &str = "unreachable";

#[derive(Default)]
pub struct FakeCaptcha {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CaptchaVerifier for FakeCaptcha {
    async fn verify(&self, token: &str, _remote_ip: &str) -> Result<bool, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match token {
            FORGED_TOKEN => Ok(false),
            UNREACHABLE_TOKEN => Err(VerifyError::Status(503)),
            _ => Ok(true),
        }
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
    /// When set, every send is rejected with this HTTP status.
    pub reject_with: Option<u16>,
}

impl RecordingMailer {
    pub fn rejecting(status: u16) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_with: Some(status),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<OutboundEmail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if let Some(status) = self.reject_with {
            return Err(MailError::Rejected { status });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Image generator with a scripted reply.
pub struct StubImages {
    pub reply: fn() -> Result<GeneratedImage, MediaError>,
}

#[async_trait]
impl ImageGenerator for StubImages {
    async fn generate(&self, _prompt: &str, _image: &str) -> Result<GeneratedImage, MediaError> {
        (self.reply)()
    }
}

/// Music generator with a scripted reply.
pub struct StubMusic {
    pub reply: fn() -> Result<Bytes, MediaError>,
}

#[async_trait]
impl MusicGenerator for StubMusic {
    async fn generate(&self) -> Result<Bytes, MediaError> {
        (self.reply)()
    }
}

/// A router wired to fakes, with handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub captcha: Arc<FakeCaptcha>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: ManualClock,
}

pub struct TestAppBuilder {
    config: Config,
    mailer: RecordingMailer,
    images: StubImages,
    music: StubMusic,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            mailer: RecordingMailer::default(),
            images: StubImages {
                reply: || {
                    Ok(GeneratedImage {
                        url: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                        text: None,
                    })
                },
            },
            music: StubMusic {
                reply: || Ok(Bytes::from_static(b"ID3\x04fake-mp3")),
            },
        }
    }
}

impl TestAppBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn mailer(mut self, mailer: RecordingMailer) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn images(mut self, reply: fn() -> Result<GeneratedImage, MediaError>) -> Self {
        self.images = StubImages { reply };
        self
    }

    pub fn music(mut self, reply: fn() -> Result<Bytes, MediaError>) -> Self {
        self.music = StubMusic { reply };
        self
    }

    pub fn build(self) -> TestApp {
        let captcha = Arc::new(FakeCaptcha::default());
        let mailer = Arc::new(self.mailer);
        let clock = ManualClock::default();

        let limiter = RateLimiter::with_store(
            self.config.rate_limit.clone(),
            Arc::new(MemoryStore::with_clock(Arc::new(clock.clone()))),
        );

        let providers = Providers {
            captcha: captcha.clone(),
            mailer: mailer.clone(),
            images: Arc::new(self.images),
            music: Arc::new(self.music),
        };
        let state = Arc::new(
            AppState::new(self.config, providers)
                .unwrap()
                .with_limiter(limiter),
        );

        TestApp {
            router: router(state.clone()),
            state,
            captcha,
            mailer,
            clock,
        }
    }
}

pub fn test_app() -> TestApp {
    TestAppBuilder::default().build()
}

/// Response status with the decoded body.
pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

impl TestApp {
    pub async fn call(&self, request: Request<Body>) -> Reply {
        let response: Response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Reply {
            status,
            headers,
            body,
        }
    }

    /// POST a JSON body to the contact endpoint from `ip`.
    pub async fn submit(&self, ip: &str, body: &Value) -> Reply {
        self.submit_raw(ip, body.to_string()).await
    }

    pub async fn submit_raw(&self, ip: &str, body: String) -> Reply {
        let request = Request::builder()
            .method("POST")
            .uri("/send-contact-email")
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(body))
            .unwrap();
        self.call(request).await
    }
}
