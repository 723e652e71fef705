//! Google Gemini provider implementation
//!
//! Talks to the generative language API (`generateContent`). Every harm
//! category is sent with `BLOCK_NONE`: the portal prompts are plain business
//! text and the legacy system ran with content filtering disabled.
//!
//! Configuration:
//! - base_url: API root (default: https://generativelanguage.googleapis.com/v1beta)
//! - api_key: opaque credential, usually from GEMINI_API_KEY
//! - model: e.g. "gemini-1.5-flash"; see [`GeminiProvider::resolve_flash_model`]

use super::{GenRequest, GenResponse, LlmProvider, ProviderError, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Model used when the flash lookup finds nothing
pub const FALLBACK_MODEL: &str = "gemini-1.5-pro";

const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini provider for the hosted generative language API
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    name: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an explicit request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let name = format!("gemini:{}", model);

        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            api_key: api_key.into(),
            model,
            name,
        }
    }

    /// List the available models and pick the first stable "flash" one,
    /// the cheap/fast tier the portal prefers. Falls back to
    /// [`FALLBACK_MODEL`] when the listing fails or has no match.
    pub async fn resolve_flash_model(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> String {
        let client = match Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(_) => return FALLBACK_MODEL.to_string(),
        };
        let url = format!(
            "{}/models?key={}",
            base_url.trim_end_matches('/'),
            api_key
        );

        let listing: Result<ModelListing, reqwest::Error> = match client.get(&url).send().await {
            Ok(response) => response.json().await,
            Err(e) => Err(e),
        };

        match listing {
            Ok(listing) => listing
                .models
                .into_iter()
                .map(|m| m.name)
                .find(|name| {
                    let lower = name.to_lowercase();
                    lower.contains("flash") && !lower.contains("exp")
                })
                .map(|name| {
                    // The listing returns "models/<id>"; the URL builder adds
                    // the prefix itself.
                    name.strip_prefix("models/").unwrap_or(&name).to_string()
                })
                .unwrap_or_else(|| FALLBACK_MODEL.to_string()),
            Err(e) => {
                warn!(error = %e, "Model listing failed, using fallback model");
                FALLBACK_MODEL.to_string()
            }
        }
    }

    fn build_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.model, method, self.api_key
        )
    }

    fn safety_settings() -> Vec<SafetySetting> {
        SAFETY_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: (*category).to_string(),
                threshold: "BLOCK_NONE".to_string(),
            })
            .collect()
    }
}

/// Gemini API request format
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

/// Gemini API response format
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

/// Model listing response (for flash resolution)
#[derive(Deserialize)]
struct ModelListing {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenRequest) -> Result<GenResponse, ProviderError> {
        let url = self.build_url("generateContent");

        let gemini_request = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![Part {
                    text: system.clone(),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
            safety_settings: Self::safety_settings(),
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("HTTP {}: {}", status, body)));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            candidates = gemini_response.candidates.len(),
            duration_ms, "Got Gemini response"
        );

        // A safety block or an empty candidate list both leave us with no
        // text; the caller decides what to show for that.
        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ProviderError::Empty)?;

        let usage = gemini_response.usage_metadata.and_then(|u| {
            match (u.prompt_token_count, u.candidates_token_count) {
                (Some(prompt), Some(completion)) => Some(TokenUsage {
                    prompt_tokens: prompt,
                    completion_tokens: completion,
                    total_tokens: u.total_token_count.unwrap_or(prompt + completion),
                }),
                _ => None,
            }
        });

        Ok(GenResponse {
            text,
            usage,
            duration_ms: Some(duration_ms),
        })
    }
}
