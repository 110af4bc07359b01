//! BingX perpetual swap integration.
//!
//! This crate provides:
//! - A rate-limited, HMAC-signed REST client for the swap endpoints
//! - Typed payload models that tolerate BingX's string-typed numerics
//! - An [`ExchangeConnector`](perp_sentry_core::traits::ExchangeConnector)
//!   implementation mapping payloads into the common raw records

pub mod client;
pub mod connector;
pub mod error;
pub mod types;

pub use client::{BingxClient, BingxClientConfig, BINGX_PROD_URL};
pub use connector::BingxConnector;
pub use error::BingxError;
pub use types::{SwapOrder, SwapPosition};
