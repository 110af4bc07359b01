//! Kraken Futures REST client with Authent signing and rate limiting.
//!
//! Private requests carry APIKey / Nonce / Authent headers. The Authent
//! value is HMAC-SHA512 (keyed with the base64-decoded secret) over
//! SHA256(postData + nonce + endpointPath), base64-encoded. The endpoint
//! path used for signing excludes the `/derivatives` prefix.

use base64::{engine::general_purpose, Engine as _};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use nonzero_ext::nonzero;
use reqwest::Client;
use sha2::{Digest, Sha256, Sha512};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{KrakenError, Result};
use crate::types::{
    OpenOrder, OpenOrdersResponse, OpenPosition, OpenPositionsResponse, Ticker, TickersResponse,
};

type HmacSha512 = Hmac<Sha512>;

/// Kraken Futures production API base URL.
pub const KRAKEN_FUTURES_PROD_URL: &str = "https://futures.kraken.com";

const OPEN_POSITIONS_PATH: &str = "/derivatives/api/v3/openpositions";
const OPEN_ORDERS_PATH: &str = "/derivatives/api/v3/openorders";
const TICKERS_PATH: &str = "/derivatives/api/v3/tickers";

/// Configuration for the Kraken Futures client.
#[derive(Debug, Clone)]
pub struct KrakenClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// API key sent in the APIKey header.
    pub api_key: String,

    /// Base64-encoded API secret.
    pub api_secret: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for KrakenClientConfig {
    fn default() -> Self {
        Self {
            base_url: KRAKEN_FUTURES_PROD_URL.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 10,
        }
    }
}

impl KrakenClientConfig {
    /// Creates a configuration with the given credentials.
    #[must_use]
    pub fn with_credentials(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
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

/// Rate-limited Kraken Futures REST client.
pub struct KrakenClient {
    http: Client,
    config: KrakenClientConfig,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl KrakenClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: KrakenClientConfig) -> Result<Self> {
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
    pub async fn get_open_positions(&self) -> Result<Vec<OpenPosition>> {
        let response: OpenPositionsResponse = self.signed_get(OPEN_POSITIONS_PATH).await?;
        check_result(&response.result, response.error)?;
        Ok(response.open_positions)
    }

    /// Fetches all open orders (trigger orders included).
    pub async fn get_open_orders(&self) -> Result<Vec<OpenOrder>> {
        let response: OpenOrdersResponse = self.signed_get(OPEN_ORDERS_PATH).await?;
        check_result(&response.result, response.error)?;
        Ok(response.open_orders)
    }

    /// Fetches all public tickers (for mark prices).
    pub async fn get_tickers(&self) -> Result<Vec<Ticker>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{TICKERS_PATH}", self.config.base_url);
        debug!(path = TICKERS_PATH, "Kraken public GET");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(KrakenError::Http {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let parsed: TickersResponse = serde_json::from_str(&body)?;
        check_result(&parsed.result, parsed.error)?;
        Ok(parsed.tickers)
    }

    async fn signed_get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let nonce = chrono::Utc::now().timestamp_millis().to_string();
        let authent = self.sign(path, &nonce, "")?;

        let url = format!("{}{path}", self.config.base_url);
        debug!(path, "Kraken signed GET");

        let response = self
            .http
            .get(&url)
            .header("APIKey", &self.config.api_key)
            .header("Nonce", &nonce)
            .header("Authent", authent)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(KrakenError::Http {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Authent = base64(HMAC-SHA512(SHA256(postData + nonce + endpointPath))).
    fn sign(&self, path: &str, nonce: &str, post_data: &str) -> Result<String> {
        let endpoint_path = path.strip_prefix("/derivatives").unwrap_or(path);
        let message = format!("{post_data}{nonce}{endpoint_path}");
        let digest = Sha256::digest(message.as_bytes());

        let secret = general_purpose::STANDARD
            .decode(&self.config.api_secret)
            .map_err(|e| KrakenError::Signing(format!("secret is not valid base64: {e}")))?;

        let mut mac = HmacSha512::new_from_slice(&secret)
            .map_err(|e| KrakenError::Signing(e.to_string()))?;
        mac.update(&digest);

        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

fn check_result(result: &str, error: Option<String>) -> Result<()> {
    if result == "success" {
        Ok(())
    } else {
        Err(KrakenError::Api(
            error.unwrap_or_else(|| format!("unexpected result: {result}")),
        ))
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
