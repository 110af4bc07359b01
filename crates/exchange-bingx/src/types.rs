//! Payload models for the BingX perpetual swap API.
//!
//! BingX reports most numerics as JSON strings and some as numbers,
//! depending on endpoint version; every numeric field here tolerates both
//! and parses to `None` on anything unreadable, so one bad field never
//! poisons the record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use perp_sentry_core::position::{Platform, Side};
use perp_sentry_core::raw::{OrderKind, RawOrder, RawPosition};

/// Accepts a string, a number, or null and parses to `Option<Decimal>`.
fn decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) if !s.is_empty() => Decimal::from_str(&s).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }))
}

/// Response envelope shared by all swap endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub code: i64,

    #[serde(default)]
    pub msg: String,

    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the envelope, mapping a nonzero code to an API error.
    pub fn into_data(self) -> crate::error::Result<Option<T>> {
        if self.code != 0 {
            return Err(crate::error::BingxError::Api {
                code: self.code,
                message: self.msg,
            });
        }
        Ok(self.data)
    }
}

// =============================================================================
// Positions
// =============================================================================

/// One entry from `/openApi/swap/v2/user/positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SwapPosition {
    #[serde(default)]
    pub symbol: String,

    /// "LONG" or "SHORT".
    #[serde(rename = "positionSide", default)]
    pub position_side: String,

    #[serde(rename = "avgPrice", default, deserialize_with = "decimal_opt")]
    pub avg_price: Option<Decimal>,

    #[serde(rename = "markPrice", default, deserialize_with = "decimal_opt")]
    pub mark_price: Option<Decimal>,

    #[serde(rename = "positionAmt", default, deserialize_with = "decimal_opt")]
    pub position_amt: Option<Decimal>,

    #[serde(rename = "positionValue", default, deserialize_with = "decimal_opt")]
    pub position_value: Option<Decimal>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub leverage: Option<Decimal>,

    /// Entry time in epoch milliseconds.
    #[serde(rename = "createTime", default)]
    pub create_time: Option<i64>,
}

impl SwapPosition {
    /// Maps the payload into the common raw record. An unrecognized side
    /// stays `None` so the normalizer can skip the record.
    #[must_use]
    pub fn to_raw(&self) -> RawPosition {
        let mut raw = RawPosition::new(Platform::BingX, self.symbol.clone());
        raw.side = match self.position_side.as_str() {
            "LONG" => Some(Side::Long),
            "SHORT" => Some(Side::Short),
            _ => None,
        };
        raw.entry_price = self.avg_price;
        raw.mark_price = self.mark_price;
        raw.leverage = self.leverage;
        raw.notional = self.position_value;
        raw.amount = self.position_amt;
        raw.created_at = self
            .create_time
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms));
        raw
    }
}

// =============================================================================
// Orders
// =============================================================================

/// `data` object of `/openApi/swap/v2/trade/openOrders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenOrdersData {
    #[serde(default)]
    pub orders: Vec<SwapOrder>,
}

/// Nested trigger leg (`takeProfit` / `stopLoss` sub-objects).
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerLeg {
    #[serde(rename = "stopPrice", default, deserialize_with = "decimal_opt")]
    pub stop_price: Option<Decimal>,
}

/// One open order; SL/TP can arrive both as nested legs and as flat
/// STOP/TAKE_PROFIT order types.
#[derive(Debug, Clone, Deserialize)]
pub struct SwapOrder {
    #[serde(default)]
    pub symbol: String,

    #[serde(rename = "type", default)]
    pub order_type: String,

    #[serde(rename = "stopPrice", default, deserialize_with = "decimal_opt")]
    pub stop_price: Option<Decimal>,

    #[serde(rename = "takeProfit", default)]
    pub take_profit: Option<TriggerLeg>,

    #[serde(rename = "stopLoss", default)]
    pub stop_loss: Option<TriggerLeg>,
}

impl SwapOrder {
    /// Expands one order into zero or more trigger records. Nested legs come
    /// first, then the flat order type.
    #[must_use]
    pub fn to_raw_orders(&self) -> Vec<RawOrder> {
        let mut out = Vec::new();

        if let Some(price) = self.stop_loss.as_ref().and_then(|l| l.stop_price) {
            out.push(self.raw_order(OrderKind::Stop, price));
        }
        if let Some(price) = self.take_profit.as_ref().and_then(|l| l.stop_price) {
            out.push(self.raw_order(OrderKind::TakeProfit, price));
        }

        if let Some(price) = self.stop_price {
            match self.order_type.as_str() {
                "STOP" | "STOP_MARKET" => out.push(self.raw_order(OrderKind::Stop, price)),
                "TAKE_PROFIT" | "TAKE_PROFIT_MARKET" => {
                    out.push(self.raw_order(OrderKind::TakeProfit, price));
                }
                _ => {}
            }
        }

        out
    }

    fn raw_order(&self, kind: OrderKind, trigger_price: Decimal) -> RawOrder {
        RawOrder {
            platform: Platform::BingX,
            symbol: self.symbol.clone(),
            kind,
            trigger_price,
        }
    }
}
