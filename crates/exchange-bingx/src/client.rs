//! BingX perpetual swap REST client with request signing and rate limiting.
//!
//! Private endpoints are signed with HMAC-SHA256 over the sorted query
//! string and authenticated via the `X-BX-APIKEY` header. Every response
//! arrives in a `{code, msg, data}` envelope; a nonzero code is surfaced as
//! an API error.

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

use crate::error::{BingxError, Result};
use crate::types::{ApiEnvelope, OpenOrdersData, SwapOrder, SwapPosition};

type HmacSha256 = Hmac<Sha256>;

/// BingX production API base URL.
pub const BINGX_PROD_URL: &str = "https://open-api.bingx.com";

const POSITIONS_PATH: &str = "/openApi/swap/v2/user/positions";
const OPEN_ORDERS_PATH: &str = "/openApi/swap/v2/trade/openOrders";

/// Configuration for the BingX client.
#[derive(Debug, Clone)]
pub struct BingxClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// API key sent in the `X-BX-APIKEY` header.
    pub api_key: String,

    /// Secret used for HMAC signing.
    pub api_secret: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Receive window forwarded to the API, in milliseconds.
    pub recv_window_ms: u64,
}

impl Default for BingxClientConfig {
    fn default() -> Self {
        Self {
            base_url: BINGX_PROD_URL.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            requests_per_minute: nonzero!(100u32),
            timeout_secs: 10,
            recv_window_ms: 5000,
        }
    }
}

impl BingxClientConfig {
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

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Rate-limited BingX REST client.
pub struct BingxClient {
    http: Client,
    config: BingxClientConfig,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl BingxClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: BingxClientConfig) -> Result<Self> {
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

    /// Fetches all open perpetual swap positions.
    pub async fn get_positions(&self) -> Result<Vec<SwapPosition>> {
        let data: Option<Vec<SwapPosition>> = self.signed_get(POSITIONS_PATH, &[]).await?;
        Ok(data.unwrap_or_default())
    }

    /// Fetches all open orders (SL/TP trigger orders included).
    pub async fn get_open_orders(&self) -> Result<Vec<SwapOrder>> {
        let data: Option<OpenOrdersData> = self.signed_get(OPEN_ORDERS_PATH, &[]).await?;
        Ok(data.map(|d| d.orders).unwrap_or_default())
    }

    /// Signed GET against a private endpoint, returning the envelope's data.
    async fn signed_get<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_params: &[(&str, String)],
    ) -> Result<Option<T>> {
        self.rate_limiter.until_ready().await;

        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let recv_window = self.config.recv_window_ms.to_string();

        let mut params: Vec<(&str, String)> = vec![
            ("recvWindow", recv_window),
            ("timestamp", timestamp),
        ];
        params.extend(extra_params.iter().cloned());
        params.sort_by(|a, b| a.0.cmp(b.0));

        let query: String = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let signature = self.sign(&query);

        let url = format!("{}{path}?{query}&signature={signature}", self.config.base_url);
        debug!(path, "BingX signed GET");

        let response = self
            .http
            .get(&url)
            .header("X-BX-APIKEY", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BingxError::Http {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        envelope.into_data()
    }

    /// HMAC-SHA256 over the query string, hex-encoded.
    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.config.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> BingxClient {
        let config = BingxClientConfig::with_credentials("test-key", "test-secret")
            .with_base_url(base_url)
            .with_timeout_secs(2);
        BingxClient::new(config).unwrap()
    }

    #[test]
    fn test_signature_is_deterministic_hex() {
        let client = test_client("http://localhost".to_string());
        let sig = client.sign("recvWindow=5000&timestamp=1700000000000");
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, client.sign("recvWindow=5000&timestamp=1700000000000"));
        assert_ne!(sig, client.sign("recvWindow=5000&timestamp=1700000000001"));
    }

    #[tokio::test]
    async fn test_get_positions_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(POSITIONS_PATH))
            .and(header_exists("X-BX-APIKEY"))
            .and(query_param_contains("signature", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "",
                "data": [{
                    "symbol": "BTC-USDT",
                    "positionSide": "LONG",
                    "avgPrice": "100000",
                    "markPrice": "101000",
                    "positionAmt": "0.01",
                    "positionValue": "1010",
                    "leverage": 10
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let positions = client.get_positions().await.unwrap();

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].symbol, "BTC-USDT");
    }

    #[tokio::test]
    async fn test_nonzero_code_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(POSITIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 100413,
                "msg": "Incorrect apiKey"
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.get_positions().await.unwrap_err();

        assert!(matches!(err, BingxError::Api { code: 100413, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_http_500_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPEN_ORDERS_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.get_open_orders().await.unwrap_err();

        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_open_orders_unwraps_nested_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPEN_ORDERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "data": {
                    "orders": [{
                        "symbol": "ETH-USDT",
                        "type": "STOP_MARKET",
                        "stopPrice": "3100"
                    }]
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let orders = client.get_open_orders().await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_type, "STOP_MARKET");
    }
}
