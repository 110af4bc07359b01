//! Kraken Futures integration.
//!
//! This crate provides:
//! - A rate-limited REST client with Authent request signing
//! - Typed payload models for positions, orders, and tickers
//! - An [`ExchangeConnector`](perp_sentry_core::traits::ExchangeConnector)
//!   implementation that joins mark prices from the public tickers

pub mod client;
pub mod connector;
pub mod error;
pub mod types;

pub use client::{KrakenClient, KrakenClientConfig, KRAKEN_FUTURES_PROD_URL};
pub use connector::KrakenConnector;
pub use error::KrakenError;
pub use types::{OpenOrder, OpenPosition, Ticker};
