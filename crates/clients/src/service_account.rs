//! Service-account access tokens (OAuth 2.0 JWT-bearer grant).
//!
//! An RS256 assertion signed with the account's private key is exchanged at
//! the token endpoint for a short-lived bearer token. Tokens are cached and
//! refreshed shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ClientError;
use crate::http::check_status;

const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Assertion lifetime accepted by the token endpoint.
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh this long before the cached token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a service-account key file the exchange needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account e-mail, used as issuer and subject.
    pub client_email: String,
    /// PKCS#8 PEM private key.
    pub private_key: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[hidden]")
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse a key file.
    ///
    /// Escaped newlines in the private key (common when the JSON passes
    /// through an environment variable) are unescaped.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let mut key: Self = serde_json::from_str(json)
            .map_err(|e| ClientError::credentials(format!("unreadable key file: {e}")))?;
        if key.client_email.trim().is_empty() {
            return Err(ClientError::credentials("client_email is empty"));
        }
        key.private_key = key
            .private_key
            .replace("\\r\\n", "\n")
            .replace("\\n", "\n")
            .trim()
            .to_string();
        Ok(key)
    }
}

/// Assertion claims.
#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    sub: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Issues and caches bearer tokens for one service account.
pub struct TokenProvider {
    client: Client,
    token_url: String,
    account: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url)
            .field("account", &self.account)
            .field("encoding_key", &"[hidden]")
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Create a provider. Fails if the private key is not a valid RSA PEM.
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        account: ServiceAccountKey,
    ) -> Result<Self, ClientError> {
        let encoding_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| ClientError::credentials(format!("private_key: {e}")))?;
        Ok(Self {
            client,
            token_url: token_url.into(),
            account,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    /// A valid bearer token, exchanging a fresh assertion when needed.
    pub async fn token(&self) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref()
            && token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
        {
            return Ok(token.value.clone());
        }

        let token = self.exchange(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, ClientError> {
        let claims = AssertionClaims {
            iss: self.account.client_email.clone(),
            sub: self.account.client_email.clone(),
            scope: SCOPE.to_string(),
            aud: self.token_url.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_TTL_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| ClientError::credentials(format!("failed to sign assertion: {e}")))
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken, ClientError> {
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ClientError::Token(e.to_string()))?;
        let response = check_status(response).await.map_err(|e| match e {
            ClientError::Status { status, body } => ClientError::Token(format!("{status} {body}")),
            other => other,
        })?;

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Token(e.to_string()))?;
        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Token("no access_token in response".to_string()))?;
        let ttl = parsed.expires_in.unwrap_or(ASSERTION_TTL_SECS);

        debug!(account = %self.account.client_email, ttl, "obtained access token");
        Ok(CachedToken {
            value,
            expires_at: now + Duration::seconds(ttl),
        })
    }
}
