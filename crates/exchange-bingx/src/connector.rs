//! `ExchangeConnector` implementation backed by the BingX client.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use perp_sentry_core::config::ExchangeCredentials;
use perp_sentry_core::position::Platform;
use perp_sentry_core::raw::{RawOrder, RawPosition};
use perp_sentry_core::traits::ExchangeConnector;

use crate::client::{BingxClient, BingxClientConfig};
use crate::error::Result as BingxResult;

pub struct BingxConnector {
    client: BingxClient,
}

impl BingxConnector {
    /// Builds a connector from the shared credential config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_credentials(credentials: &ExchangeCredentials) -> BingxResult<Self> {
        let config = BingxClientConfig::with_credentials(
            credentials.api_key.clone(),
            credentials.api_secret.clone(),
        )
        .with_base_url(credentials.base_url.clone());

        Ok(Self {
            client: BingxClient::new(config)?,
        })
    }

    #[must_use]
    pub fn new(client: BingxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExchangeConnector for BingxConnector {
    fn platform(&self) -> Platform {
        Platform::BingX
    }

    async fn fetch_positions(&self) -> Result<Vec<RawPosition>> {
        let positions = self.client.get_positions().await?;
        // closed positions linger in the response with zero size
        Ok(positions
            .iter()
            .filter(|p| p.position_amt.unwrap_or(Decimal::ZERO) != Decimal::ZERO)
            .map(|p| p.to_raw())
            .collect())
    }

    async fn fetch_open_orders(&self) -> Result<Vec<RawOrder>> {
        let orders = self.client.get_open_orders().await?;
        Ok(orders.iter().flat_map(|o| o.to_raw_orders()).collect())
    }
}
