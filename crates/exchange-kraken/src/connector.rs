//! `ExchangeConnector` implementation backed by the Kraken Futures client.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

use perp_sentry_core::config::ExchangeCredentials;
use perp_sentry_core::position::Platform;
use perp_sentry_core::raw::{RawOrder, RawPosition};
use perp_sentry_core::traits::ExchangeConnector;

use crate::client::{KrakenClient, KrakenClientConfig};
use crate::error::Result as KrakenResult;

pub struct KrakenConnector {
    client: KrakenClient,
}

impl KrakenConnector {
    /// Builds a connector from the shared credential config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_credentials(credentials: &ExchangeCredentials) -> KrakenResult<Self> {
        let config = KrakenClientConfig::with_credentials(
            credentials.api_key.clone(),
            credentials.api_secret.clone(),
        )
        .with_base_url(credentials.base_url.clone());

        Ok(Self {
            client: KrakenClient::new(config)?,
        })
    }

    #[must_use]
    pub fn new(client: KrakenClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExchangeConnector for KrakenConnector {
    fn platform(&self) -> Platform {
        Platform::Kraken
    }

    async fn fetch_positions(&self) -> Result<Vec<RawPosition>> {
        let positions = self.client.get_open_positions().await?;

        // open positions carry no mark price; join it from public tickers.
        // A ticker failure degrades to missing marks, not a failed fetch.
        let mark_prices: HashMap<String, Decimal> = match self.client.get_tickers().await {
            Ok(tickers) => tickers
                .into_iter()
                .filter_map(|t| t.mark_price.map(|p| (t.symbol, p)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Kraken tickers fetch failed, mark prices left unset");
                HashMap::new()
            }
        };

        Ok(positions
            .iter()
            .filter(|p| p.size.unwrap_or(Decimal::ZERO) != Decimal::ZERO)
            .map(|p| p.to_raw(&mark_prices))
            .collect())
    }

    async fn fetch_open_orders(&self) -> Result<Vec<RawOrder>> {
        let orders = self.client.get_open_orders().await?;
        Ok(orders.iter().filter_map(|o| o.to_raw_order()).collect())
    }
}
