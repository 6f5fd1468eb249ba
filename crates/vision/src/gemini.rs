use crate::{VisionClient, VisionError, VisionResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for [`GeminiClient`]
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL up to and including the API version, e.g. `.../v1beta`
    pub endpoint: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.4,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 4096,
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    options: GeminiOptions,
}

impl GeminiClient {
    pub fn new(options: GeminiOptions) -> VisionResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;

        if options.api_key.is_none() {
            warn!("No Gemini API key configured; image descriptions will fail");
        }

        Ok(Self { http, options })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.options.endpoint.trim_end_matches('/'),
            self.options.model
        )
    }

    fn request_body<'a>(&self, image_b64: &'a str, mime_type: &'a str, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: image_b64,
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.options.temperature,
                top_p: self.options.top_p,
                top_k: self.options.top_k,
                max_output_tokens: self.options.max_output_tokens,
                response_mime_type: "application/json",
            },
        }
    }
}

#[async_trait]
impl VisionClient for GeminiClient {
    async fn generate(&self, image: &[u8], mime_type: &str, prompt: &str) -> VisionResult<String> {
        let api_key = self
            .options
            .api_key
            .as_deref()
            .ok_or_else(|| VisionError::Configuration("GEMINI_API_KEY is not set".to_string()))?;

        info!(
            "Describing {} byte image via Gemini {}",
            image.len(),
            self.options.model
        );

        let image_b64 = STANDARD.encode(image);
        let body = self.request_body(&image_b64, mime_type, prompt);

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_slice(&response.bytes().await?)?;
        let text = parsed.text();
        debug!("Gemini returned {} characters", text.len());

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated. Blocked or empty
    /// answers yield an empty string.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
