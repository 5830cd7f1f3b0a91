//! Document AI `:process` client.

use std::sync::Arc;

use autobook_core::pipeline::{DocumentExtractor, ExtractionError};
use autobook_shared::ExtractionConfig;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;
use crate::http::{build_client, check_status};
use crate::service_account::{ServiceAccountKey, TokenProvider};

const PDF_MIME_TYPE: &str = "application/pdf";

/// Text extraction client.
#[derive(Clone, Debug)]
pub struct DocumentAiClient {
    client: Client,
    process_url: String,
    tokens: Arc<TokenProvider>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    raw_document: RawDocument,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    content: String,
    mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessResponse {
    #[serde(default)]
    document: Option<ProcessedDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessedDocument {
    #[serde(default)]
    text: Option<String>,
}

impl ProcessResponse {
    fn into_text(self) -> String {
        self.document.and_then(|d| d.text).unwrap_or_default()
    }
}

impl DocumentAiClient {
    /// Create a client from configuration.
    ///
    /// Fails on an unreadable service-account key.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ClientError> {
        let client = build_client(config.request_timeout_secs)?;
        let account = ServiceAccountKey::from_json(&config.service_account_json)?;
        let tokens = TokenProvider::new(client.clone(), config.token_url.clone(), account)?;
        Ok(Self {
            client,
            process_url: config.process_url(),
            tokens: Arc::new(tokens),
        })
    }

    async fn process(&self, pdf: &[u8]) -> Result<String, ClientError> {
        let token = self.tokens.token().await?;
        let body = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(pdf),
                mime_type: PDF_MIME_TYPE,
            },
        };

        let response = self
            .client
            .post(&self.process_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::transport(&e))?;
        let response = check_status(response).await?;

        let parsed: ProcessResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let text = parsed.into_text();
        debug!(bytes = pdf.len(), chars = text.len(), "document processed");
        Ok(text)
    }
}

impl DocumentExtractor for DocumentAiClient {
    async fn extract_text(&self, pdf: Vec<u8>) -> Result<String, ExtractionError> {
        Ok(self.process(&pdf).await?)
    }
}
