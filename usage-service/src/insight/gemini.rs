use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerateError, TextGenerator};
use crate::config::InsightsConfig;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// REST client for a Gemini-style `generateContent` endpoint.
///
/// Built once at startup and injected wherever text generation is needed.
/// A missing API key is carried as state and surfaced as a configuration
/// error at request time, so the rest of the service still boots.
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiClient {
    pub fn from_config(cfg: &InsightsConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: cfg.resolved_api_key(),
            model: cfg.model.clone(),
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::Unconfigured)?;
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    GenerateError::Unreachable(e.to_string())
                } else {
                    GenerateError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Upstream(format!("status {status}")));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?;

        let text = payload
            .candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(GenerateError::Upstream("empty candidate text".to_string()));
        }

        Ok(text)
    }
}
