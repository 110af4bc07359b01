//! Payload models for the Blofin futures API.
//!
//! Blofin reports every numeric as a JSON string; fields parse to `None`
//! on anything unreadable so one bad field never poisons the record.

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

/// Response envelope shared by all endpoints; the code arrives as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub msg: String,

    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the envelope, mapping a non-"0" code to an API error.
    pub fn into_data(self) -> crate::error::Result<Option<T>> {
        if !self.code.is_empty() && self.code != "0" {
            return Err(crate::error::BlofinError::Api {
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

/// One entry from `/api/v1/account/positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountPosition {
    #[serde(rename = "instId", default)]
    pub inst_id: String,

    /// "long", "short", or "net" (sign of `positions` decides).
    #[serde(rename = "positionSide", default)]
    pub position_side: String,

    /// Signed position quantity.
    #[serde(default, deserialize_with = "decimal_opt")]
    pub positions: Option<Decimal>,

    #[serde(rename = "averagePrice", default, deserialize_with = "decimal_opt")]
    pub average_price: Option<Decimal>,

    #[serde(rename = "markPrice", default, deserialize_with = "decimal_opt")]
    pub mark_price: Option<Decimal>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub leverage: Option<Decimal>,

    /// Allocated margin; notional is reconstructed as margin * leverage.
    #[serde(default, deserialize_with = "decimal_opt")]
    pub margin: Option<Decimal>,

    /// Entry time in epoch milliseconds, as a string.
    #[serde(rename = "createTime", default)]
    pub create_time: Option<String>,
}

impl AccountPosition {
    /// Maps the payload into the common raw record.
    #[must_use]
    pub fn to_raw(&self) -> RawPosition {
        let quantity = self.positions;

        let mut raw = RawPosition::new(Platform::Blofin, self.inst_id.clone());
        raw.side = match self.position_side.as_str() {
            "long" => Some(Side::Long),
            "short" => Some(Side::Short),
            // net mode: the quantity sign carries the direction
            "net" => quantity.and_then(|q| {
                if q > Decimal::ZERO {
                    Some(Side::Long)
                } else if q < Decimal::ZERO {
                    Some(Side::Short)
                } else {
                    None
                }
            }),
            _ => None,
        };
        raw.entry_price = self.average_price;
        raw.mark_price = self.mark_price;
        raw.leverage = self.leverage;
        raw.notional = match (self.margin, self.leverage) {
            (Some(margin), Some(leverage)) => Some((margin * leverage).abs()),
            _ => None,
        };
        raw.amount = quantity;
        raw.created_at = self
            .create_time
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        raw
    }
}

// =============================================================================
// TP/SL orders
// =============================================================================

/// One entry from `/api/v1/trade/orders-tpsl-pending`. A single pending
/// TP/SL order can carry both trigger legs.
#[derive(Debug, Clone, Deserialize)]
pub struct TpslOrder {
    #[serde(rename = "instId", default)]
    pub inst_id: String,

    #[serde(rename = "tpTriggerPrice", default, deserialize_with = "decimal_opt")]
    pub tp_trigger_price: Option<Decimal>,

    #[serde(rename = "slTriggerPrice", default, deserialize_with = "decimal_opt")]
    pub sl_trigger_price: Option<Decimal>,
}

impl TpslOrder {
    /// Expands the pending order into zero, one, or two trigger records.
    #[must_use]
    pub fn to_raw_orders(&self) -> Vec<RawOrder> {
        let mut out = Vec::new();

        if let Some(price) = self.sl_trigger_price {
            out.push(RawOrder {
                platform: Platform::Blofin,
                symbol: self.inst_id.clone(),
                kind: OrderKind::Stop,
                trigger_price: price,
            });
        }
        if let Some(price) = self.tp_trigger_price {
            out.push(RawOrder {
                platform: Platform::Blofin,
                symbol: self.inst_id.clone(),
                kind: OrderKind::TakeProfit,
                trigger_price: price,
            });
        }

        out
    }
}
