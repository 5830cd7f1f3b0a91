//! Shared request plumbing.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::ClientError;

/// Error bodies are cut to this many characters.
const MAX_ERROR_BODY: usize = 500;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClientError::Setup(e.to_string()))
}

/// Passes success responses through; turns anything else into [`ClientError::Status`].
pub(crate) async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}
