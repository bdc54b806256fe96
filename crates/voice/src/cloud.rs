//! HTTP speech synthesis against a DashScope-style TTS endpoint.
//!
//! Request:
//!
//! ```json
//! {
//!   "model": "cosyvoice-v1",
//!   "input": {"text": "...", "voice": "longlaotie"},
//!   "parameters": {"format": "mp3"}
//! }
//! ```
//!
//! The service either answers with the audio body directly (`audio/*`) or
//! with JSON carrying `output.audio.data` (base64) or `output.audio.url`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};

use narrator_common::config::VoiceDefaults;
use narrator_common::error::{NarratorError, NarratorResult};

use crate::synth::SpeechSynthesizer;

/// Cloud TTS client authenticated with a bearer API key.
pub struct CloudSynthesizer {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    format: String,
}

/// Where the audio of a JSON response lives.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechPayload {
    Inline(Vec<u8>),
    Url(String),
}

impl CloudSynthesizer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        format: impl Into<String>,
        timeout: Duration,
    ) -> NarratorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NarratorError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            format: format.into(),
        })
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(voice: &VoiceDefaults) -> NarratorResult<Self> {
        let api_key = std::env::var(&voice.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                NarratorError::synthesis(format!(
                    "environment variable {} is not set; it must hold the speech API key",
                    voice.api_key_env
                ))
            })?;
        Self::new(
            &voice.endpoint,
            api_key,
            &voice.model,
            &voice.format,
            Duration::from_secs(voice.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn download(&self, url: &str) -> NarratorResult<Vec<u8>> {
        tracing::debug!(url, "Downloading synthesized audio");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                NarratorError::synthesis_transient(format!("audio download failed: {e}"))
            })?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| {
                NarratorError::synthesis_transient(format!("audio download failed: {e}"))
            })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> NarratorResult<Vec<u8>> {
        let body = request_body(&self.model, text, voice, &self.format);
        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                NarratorError::synthesis_transient(format!("failed to reach speech service: {e}"))
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let bytes = resp.bytes().await.map_err(|e| {
            NarratorError::synthesis_transient(format!("failed to read speech response: {e}"))
        })?;

        if is_audio_content_type(&content_type) {
            return Ok(bytes.to_vec());
        }

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            NarratorError::synthesis(format!(
                "unexpected speech response ({content_type}): {e}"
            ))
        })?;
        match parse_json_payload(&value)? {
            SpeechPayload::Inline(audio) => Ok(audio),
            SpeechPayload::Url(url) => self.download(&url).await,
        }
    }

    fn name(&self) -> &str {
        "cloud-tts"
    }

    fn clip_extension(&self) -> &str {
        &self.format
    }
}

/// JSON body of a synthesis request.
pub fn request_body(model: &str, text: &str, voice: &str, format: &str) -> Value {
    json!({
        "model": model,
        "input": {
            "text": text,
            "voice": voice,
        },
        "parameters": {
            "format": format,
        },
    })
}

/// Map a failed HTTP status to a synthesis error.
///
/// 429 and 5xx are transient; every other status is permanent.
pub fn classify_status(status: u16, body: &str) -> NarratorError {
    let detail = body.trim();
    let message = if detail.is_empty() {
        format!("speech service returned HTTP {status}")
    } else {
        format!("speech service returned HTTP {status}: {detail}")
    };
    if status == 429 || (500..600).contains(&status) {
        NarratorError::synthesis_transient(message)
    } else {
        NarratorError::synthesis(message)
    }
}

fn is_audio_content_type(content_type: &str) -> bool {
    content_type.starts_with("audio/") || content_type.starts_with("application/octet-stream")
}

/// Extract the audio location from a JSON response.
pub fn parse_json_payload(value: &Value) -> NarratorResult<SpeechPayload> {
    let audio = &value["output"]["audio"];
    if let Some(data) = audio["data"].as_str().filter(|d| !d.is_empty()) {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| NarratorError::synthesis(format!("invalid base64 audio: {e}")))?;
        return Ok(SpeechPayload::Inline(bytes));
    }
    if let Some(url) = audio["url"].as_str().filter(|u| !u.is_empty()) {
        return Ok(SpeechPayload::Url(url.to_string()));
    }

    let code = value["code"].as_str().unwrap_or("unknown");
    let message = value["message"].as_str().unwrap_or("response carried no audio");
    Err(NarratorError::synthesis(format!(
        "speech service error {code}: {message}"
    )))
}
