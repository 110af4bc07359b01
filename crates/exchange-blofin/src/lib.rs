//! Blofin futures integration.
//!
//! This crate provides:
//! - A rate-limited REST client with ACCESS-SIGN request signing
//! - Typed payload models for positions and pending TP/SL orders
//! - An [`ExchangeConnector`](perp_sentry_core::traits::ExchangeConnector)
//!   implementation mapping payloads into the common raw records

pub mod client;
pub mod connector;
pub mod error;
pub mod types;

pub use client::{BlofinClient, BlofinClientConfig, BLOFIN_PROD_URL};
pub use connector::BlofinConnector;
pub use error::BlofinError;
pub use types::{AccountPosition, TpslOrder};
