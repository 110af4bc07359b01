//! `ExchangeConnector` implementation backed by the Blofin client.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use perp_sentry_core::config::ExchangeCredentials;
use perp_sentry_core::position::Platform;
use perp_sentry_core::raw::{RawOrder, RawPosition};
use perp_sentry_core::traits::ExchangeConnector;

use crate::client::{BlofinClient, BlofinClientConfig};
use crate::error::Result as BlofinResult;

pub struct BlofinConnector {
    client: BlofinClient,
}

impl BlofinConnector {
    /// Builds a connector from the shared credential config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_credentials(credentials: &ExchangeCredentials) -> BlofinResult<Self> {
        let config = BlofinClientConfig::with_credentials(
            credentials.api_key.clone(),
            credentials.api_secret.clone(),
            credentials.passphrase.clone().unwrap_or_default(),
        )
        .with_base_url(credentials.base_url.clone());

        Ok(Self {
            client: BlofinClient::new(config)?,
        })
    }

    #[must_use]
    pub fn new(client: BlofinClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExchangeConnector for BlofinConnector {
    fn platform(&self) -> Platform {
        Platform::Blofin
    }

    async fn fetch_positions(&self) -> Result<Vec<RawPosition>> {
        let positions = self.client.get_positions().await?;
        Ok(positions
            .iter()
            .filter(|p| p.positions.unwrap_or(Decimal::ZERO) != Decimal::ZERO)
            .map(|p| p.to_raw())
            .collect())
    }

    async fn fetch_open_orders(&self) -> Result<Vec<RawOrder>> {
        let orders = self.client.get_tpsl_pending().await?;
        Ok(orders.iter().flat_map(|o| o.to_raw_orders()).collect())
    }
}
