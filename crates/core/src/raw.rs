//! Pre-normalization records produced by the exchange adapters.
//!
//! Every exchange reports positions and trigger orders in its own shape;
//! adapters map those payloads into these two records, leaving unparseable
//! numerics as `None` so the normalizer can apply defaults or skip the
//! record without failing the batch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::position::{Platform, Side};

/// A position as reported by one exchange, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPosition {
    pub platform: Platform,
    pub symbol: String,

    /// `None` when the exchange reported an unrecognized side; the
    /// normalizer skips such records.
    pub side: Option<Side>,

    pub entry_price: Option<Decimal>,
    pub mark_price: Option<Decimal>,
    pub leverage: Option<Decimal>,

    /// Notional value in quote currency, when reported directly.
    pub notional: Option<Decimal>,

    /// Contract size or token amount; may be negative for shorts on some
    /// venues.
    pub amount: Option<Decimal>,

    pub created_at: Option<DateTime<Utc>>,
}

impl RawPosition {
    /// An empty record for the given identity; adapters fill in what the
    /// payload provides.
    #[must_use]
    pub fn new(platform: Platform, symbol: impl Into<String>) -> Self {
        Self {
            platform,
            symbol: symbol.into(),
            side: None,
            entry_price: None,
            mark_price: None,
            leverage: None,
            notional: None,
            amount: None,
            created_at: None,
        }
    }
}

/// Trigger order kind relevant to SL/TP joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Stop,
    TakeProfit,
}

/// An open trigger order, consumed only to populate `sl_price`/`tp_price`
/// on the matching position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrder {
    pub platform: Platform,
    pub symbol: String,
    pub kind: OrderKind,
    pub trigger_price: Decimal,
}
