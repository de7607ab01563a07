// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Pass-through proxies for AI media providers.
//!
//! - Tee preview: sends the shopper's photo and a generated prompt to an
//!   OpenAI-compatible chat-completions gateway and returns the image URL.
//! - Birthday music: asks the ElevenLabs music API for a short instrumental
//!   and streams the MP3 back.

use crate::config::MediaConfig;
use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

const BIRTHDAY_PROMPT: &str = "Cheerful happy birthday instrumental music, upbeat celebration, joyful party atmosphere, acoustic guitar and piano, warm and festive";

const DEFAULT_POSE_CLAUSE: &str =
    "Keep the person in the same pose and setting, but change their top to this t-shirt.";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("user image is missing")]
    MissingImage,

    #[error("{0} API key is not configured")]
    NotConfigured(&'static str),

    #[error("provider rate limited the request")]
    UpstreamRateLimited,

    #[error("provider requires payment")]
    UpstreamPaymentRequired,

    #[error("provider returned HTTP {0}")]
    Upstream(u16),

    #[error("provider reply contained no image")]
    NoImage,

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Body posted by the tee preview widget.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeeImageRequest {
    #[serde(default)]
    pub user_image_base64: Option<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

/// Reply for the tee preview widget.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeeImage {
    pub image_url: String,
    pub message: String,
}

/// What the image provider produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
    pub text: Option<String>,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, image_data_url: &str)
        -> Result<GeneratedImage, MediaError>;
}

#[async_trait]
pub trait MusicGenerator: Send + Sync {
    async fn generate(&self) -> Result<Bytes, MediaError>;
}

/// Map a catalogue colour name to the phrase used in the prompt.
pub fn describe_color(color: &str) -> String {
    let described = match color {
        "White" => "pure white",
        "Coral" => "coral orange",
        "Mauve" => "soft mauve pink",
        "Sunset" => "warm sunset orange",
        "Tan" => "light tan beige",
        "Army" => "army green olive",
        "Dark Heather" => "dark heather charcoal gray",
        "Olive" => "olive green",
        "Ice Blue" => "light ice blue",
        "Blue Jean" => "faded blue jean denim blue",
        "Grey" => "medium grey",
        "Sky" => "light sky blue",
        "Brown Savana" => "brown savana earthy brown",
        "Espresso" => "dark espresso brown",
        "Black" => "solid black",
        "Navy" => "navy blue",
        "Pink" => "soft pink",
        "Peachy" => "peachy coral pink",
        "Red" => "vibrant red",
        other => return other.to_lowercase(),
    };
    described.to_string()
}

pub fn build_tee_prompt(request: &TeeImageRequest) -> String {
    let styling = match request.custom_prompt.as_deref() {
        Some(custom) if !custom.is_empty() => custom,
        _ => DEFAULT_POSE_CLAUSE,
    };

    format!(
        "Transform this person's photo to show them wearing a {color} colored t-shirt with a small black Labrador dog embroidered logo on the upper left chest area. \
         The t-shirt should be a casual crew-neck style, size {size}. {styling} \
         The image should look natural and realistic, like a professional product photo. \
         The black Labrador logo should be small and subtle, positioned on the upper left chest.",
        color = describe_color(&request.color),
        size = request.size,
    )
}

/// Validate the request, build the prompt and ask the generator for a preview.
pub async fn render_tee_preview(
    generator: &dyn ImageGenerator,
    request: &TeeImageRequest,
) -> Result<TeeImage, MediaError> {
    let image = match request.user_image_base64.as_deref() {
        Some(img) if !img.is_empty() => img,
        _ => return Err(MediaError::MissingImage),
    };

    let prompt = build_tee_prompt(request);
    debug!(prompt = %prompt, "Generating tee preview");

    let generated = generator.generate(&prompt, image).await?;
    info!("Tee preview generated");

    Ok(TeeImage {
        image_url: generated.url,
        message: generated
            .text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Image generated successfully!".to_string()),
    })
}

/// Chat-completions image gateway client.
pub struct GatewayImageGenerator {
    api_key: Option<String>,
    url: String,
    model: String,
    client: reqwest::Client,
}

impl GatewayImageGenerator {
    pub fn new(config: &MediaConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &MediaConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.image_api_key.clone(),
            url: config.image_gateway_url.clone(),
            model: config.image_model.clone(),
            client,
        }
    }
}

#[async_trait]
impl ImageGenerator for GatewayImageGenerator {
    async fn generate(
        &self,
        prompt: &str,
        image_data_url: &str,
    ) -> Result<GeneratedImage, MediaError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(MediaError::NotConfigured("image gateway"))?;

        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image_data_url } }
                ]
            }],
            "modalities": ["image", "text"]
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), detail = %detail, "AI gateway error");
            return Err(match status.as_u16() {
                429 => MediaError::UpstreamRateLimited,
                402 => MediaError::UpstreamPaymentRequired,
                other => MediaError::Upstream(other),
            });
        }

        let reply: Value = response.json().await?;
        let url = reply
            .pointer("/choices/0/message/images/0/image_url/url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                error!(reply = %reply, "No image in gateway reply");
                MediaError::NoImage
            })?;
        let text = reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str);

        Ok(GeneratedImage {
            url: url.to_string(),
            text: text.map(str::to_string),
        })
    }
}

/// ElevenLabs music API client.
pub struct ElevenLabsMusic {
    api_key: Option<String>,
    url: String,
    duration_secs: u32,
    client: reqwest::Client,
}

impl ElevenLabsMusic {
    pub fn new(config: &MediaConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &MediaConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.music_api_key.clone(),
            url: config.music_api_url.clone(),
            duration_secs: config.music_duration_secs,
            client,
        }
    }
}

#[async_trait]
impl MusicGenerator for ElevenLabsMusic {
    async fn generate(&self) -> Result<Bytes, MediaError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(MediaError::NotConfigured("music"))?;

        let response = self
            .client
            .post(&self.url)
            .header("xi-api-key", api_key)
            .json(&json!({
                "prompt": BIRTHDAY_PROMPT,
                "duration_seconds": self.duration_secs,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), detail = %detail, "ElevenLabs API error");
            return Err(MediaError::Upstream(status.as_u16()));
        }

        let audio = response.bytes().await?;
        info!(bytes = audio.len(), "Birthday music generated");
        Ok(audio)
    }
}
