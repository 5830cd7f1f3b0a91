//! Gemini `generateContent` client.

use autobook_core::pipeline::{GenerationError, TextGenerator};
use autobook_shared::GenerationConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;
use crate::http::{build_client, check_status};

/// Text-generation client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    url: String,
    api_key: String,
    temperature: f32,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("url", &self.url)
            .field("api_key", &"[hidden]")
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationSettings,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationSettings {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, trimmed; empty if absent.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    }
}

impl GeminiClient {
    /// Create a client from configuration.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_client(config.request_timeout_secs)?,
            url: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }

    async fn request(&self, prompt: &str) -> Result<String, ClientError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationSettings {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::transport(&e))?;
        let response = check_status(response).await?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let text = parsed.into_text();
        debug!(chars = text.len(), "generation reply received");
        Ok(text)
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(self.request(prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenerationConfig {
        GenerationConfig {
            api_key: "secret".to_string(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            temperature: 1.0,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_url_from_config() {
        let client = GeminiClient::from_config(&config()).expect("client builds");
        assert_eq!(
            client.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GeminiClient::from_config(&config()).expect("client builds");
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: "hello" }],
            }],
            generation_config: GenerationSettings { temperature: 1.0 },
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_reply_text_is_trimmed() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  {\"a\":1}\n"}]}}]}"#,
        )
        .expect("parses");
        assert_eq!(parsed.into_text(), r#"{"a":1}"#);
    }

    #[test]
    fn test_missing_candidates_read_as_empty() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).expect("parses");
        assert_eq!(parsed.into_text(), "");

        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).expect("parses");
        assert_eq!(parsed.into_text(), "");
    }
}
