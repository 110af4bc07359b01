//! Blofin REST client with ACCESS-SIGN request signing and rate limiting.
//!
//! Private requests carry ACCESS-KEY / ACCESS-SIGN / ACCESS-TIMESTAMP /
//! ACCESS-NONCE / ACCESS-PASSPHRASE headers. The signature is the hex
//! digest of HMAC-SHA256 over `path + method + timestamp + nonce + body`,
//! base64-encoded.

use base64::{engine::general_purpose, Engine as _};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{BlofinError, Result};
use crate::types::{AccountPosition, ApiEnvelope, TpslOrder};

type HmacSha256 = Hmac<Sha256>;

/// Blofin production API base URL.
pub const BLOFIN_PROD_URL: &str = "https://openapi.blofin.com";

const POSITIONS_PATH: &str = "/api/v1/account/positions";
const TPSL_PENDING_PATH: &str = "/api/v1/trade/orders-tpsl-pending";

/// Configuration for the Blofin client.
#[derive(Debug, Clone)]
pub struct BlofinClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// API key sent in the ACCESS-KEY header.
    pub api_key: String,

    /// Secret used for HMAC signing.
    pub api_secret: String,

    /// API passphrase sent in the ACCESS-PASSPHRASE header.
    pub passphrase: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BlofinClientConfig {
    fn default() -> Self {
        Self {
            base_url: BLOFIN_PROD_URL.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            passphrase: String::new(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 10,
        }
    }
}

impl BlofinClientConfig {
    /// Creates a configuration with the given credentials.
    #[must_use]
    pub fn with_credentials(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            passphrase: passphrase.into(),
            ..Default::default()
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Rate-limited Blofin REST client.
pub struct BlofinClient {
    http: Client,
    config: BlofinClientConfig,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl BlofinClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: BlofinClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            http,
            config,
            rate_limiter,
        })
    }

    /// Fetches all open futures positions.
    pub async fn get_positions(&self) -> Result<Vec<AccountPosition>> {
        let data: Option<Vec<AccountPosition>> = self.signed_get(POSITIONS_PATH).await?;
        Ok(data.unwrap_or_default())
    }

    /// Fetches all pending TP/SL orders.
    pub async fn get_tpsl_pending(&self) -> Result<Vec<TpslOrder>> {
        let data: Option<Vec<TpslOrder>> = self.signed_get(TPSL_PENDING_PATH).await?;
        Ok(data.unwrap_or_default())
    }

    async fn signed_get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        self.rate_limiter.until_ready().await;

        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let nonce = uuid::Uuid::new_v4().to_string();
        let signature = self.sign(path, "GET", &timestamp, &nonce, "");

        let url = format!("{}{path}", self.config.base_url);
        debug!(path, "Blofin signed GET");

        let response = self
            .http
            .get(&url)
            .header("ACCESS-KEY", &self.config.api_key)
            .header("ACCESS-SIGN", signature)
            .header("ACCESS-TIMESTAMP", &timestamp)
            .header("ACCESS-NONCE", &nonce)
            .header("ACCESS-PASSPHRASE", &self.config.passphrase)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BlofinError::Http {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        envelope.into_data()
    }

    /// Base64 of the hex HMAC-SHA256 digest over the prehash string.
    fn sign(&self, path: &str, method: &str, timestamp: &str, nonce: &str, body: &str) -> String {
        let prehash = format!("{path}{method}{timestamp}{nonce}{body}");
        let mut mac = HmacSha256::new_from_slice(self.config.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(prehash.as_bytes());
        let hex_digest = hex::encode(mac.finalize().into_bytes());
        general_purpose::STANDARD.encode(hex_digest.as_bytes())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
