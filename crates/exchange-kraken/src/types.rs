//! Payload models for the Kraken Futures API.
//!
//! Kraken Futures reports numerics as JSON numbers. The open-positions
//! endpoint carries no mark price, so the adapter joins mark prices in from
//! the public tickers endpoint by symbol.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use perp_sentry_core::position::{Platform, Side};
use perp_sentry_core::raw::{OrderKind, RawOrder, RawPosition};

/// `/derivatives/api/v3/openpositions` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenPositionsResponse {
    #[serde(default)]
    pub result: String,

    #[serde(rename = "openPositions", default)]
    pub open_positions: Vec<OpenPosition>,

    #[serde(default)]
    pub error: Option<String>,
}

/// `/derivatives/api/v3/openorders` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrdersResponse {
    #[serde(default)]
    pub result: String,

    #[serde(rename = "openOrders", default)]
    pub open_orders: Vec<OpenOrder>,

    #[serde(default)]
    pub error: Option<String>,
}

/// `/derivatives/api/v3/tickers` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TickersResponse {
    #[serde(default)]
    pub result: String,

    #[serde(default)]
    pub tickers: Vec<Ticker>,

    #[serde(default)]
    pub error: Option<String>,
}

/// One open futures position.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenPosition {
    #[serde(default)]
    pub symbol: String,

    /// "long" or "short".
    #[serde(default)]
    pub side: String,

    /// Average entry price.
    #[serde(default)]
    pub price: Option<Decimal>,

    #[serde(default)]
    pub size: Option<Decimal>,

    #[serde(rename = "effectiveLeverage", default)]
    pub effective_leverage: Option<Decimal>,

    /// RFC 3339 fill time of the opening trade.
    #[serde(rename = "fillTime", default)]
    pub fill_time: Option<String>,
}

impl OpenPosition {
    /// Maps the payload into the common raw record, joining the mark price
    /// from the tickers map.
    #[must_use]
    pub fn to_raw(&self, mark_prices: &HashMap<String, Decimal>) -> RawPosition {
        let mut raw = RawPosition::new(Platform::Kraken, self.symbol.clone());
        raw.side = match self.side.as_str() {
            "long" => Some(Side::Long),
            "short" => Some(Side::Short),
            _ => None,
        };
        raw.entry_price = self.price;
        raw.mark_price = mark_prices.get(&self.symbol).copied();
        raw.leverage = self.effective_leverage;
        raw.amount = self.size;
        raw.created_at = self
            .fill_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        raw
    }
}

/// One open order; only stop and take-profit orders are relevant here.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrder {
    #[serde(default)]
    pub symbol: String,

    /// "lmt", "stp", "take_profit", ...
    #[serde(rename = "orderType", default)]
    pub order_type: String,

    #[serde(rename = "stopPrice", default)]
    pub stop_price: Option<Decimal>,
}

impl OpenOrder {
    /// Maps a trigger order to a raw record; other order types map to
    /// nothing.
    #[must_use]
    pub fn to_raw_order(&self) -> Option<RawOrder> {
        let kind = match self.order_type.as_str() {
            "stp" => OrderKind::Stop,
            "take_profit" => OrderKind::TakeProfit,
            _ => return None,
        };

        Some(RawOrder {
            platform: Platform::Kraken,
            symbol: self.symbol.clone(),
            kind,
            trigger_price: self.stop_price?,
        })
    }
}

/// One public ticker entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    #[serde(default)]
    pub symbol: String,

    #[serde(rename = "markPrice", default)]
    pub mark_price: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_payload_maps_to_raw() {
        let json = serde_json::json!({
            "symbol": "PF_XBTUSD",
            "side": "long",
            "price": 100000.0,
            "size": 0.012,
            "effectiveLeverage": 4.2,
            "fillTime": "2025-07-01T12:00:00.000Z"
        });

        let position: OpenPosition = serde_json::from_value(json).unwrap();
        let marks = HashMap::from([("PF_XBTUSD".to_string(), dec!(103000))]);
        let raw = position.to_raw(&marks);

        assert_eq!(raw.platform, Platform::Kraken);
        assert_eq!(raw.side, Some(Side::Long));
        assert_eq!(raw.entry_price, Some(dec!(100000.0)));
        assert_eq!(raw.mark_price, Some(dec!(103000)));
        assert_eq!(raw.leverage, Some(dec!(4.2)));
        assert_eq!(raw.amount, Some(dec!(0.012)));
        assert!(raw.created_at.is_some());
    }

    #[test]
    fn test_position_without_ticker_has_no_mark() {
        let json = serde_json::json!({
            "symbol": "PF_ETHUSD",
            "side": "short",
            "price": 3000.0,
            "size": 1.0
        });

        let position: OpenPosition = serde_json::from_value(json).unwrap();
        let raw = position.to_raw(&HashMap::new());

        assert_eq!(raw.mark_price, None);
        assert_eq!(raw.side, Some(Side::Short));
    }

    #[test]
    fn test_stop_order_maps() {
        let json = serde_json::json!({
            "symbol": "PF_XBTUSD",
            "orderType": "stp",
            "stopPrice": 95000.0
        });

        let order: OpenOrder = serde_json::from_value(json).unwrap();
        let raw = order.to_raw_order().unwrap();

        assert_eq!(raw.kind, OrderKind::Stop);
        assert_eq!(raw.trigger_price, dec!(95000.0));
    }

    #[test]
    fn test_take_profit_order_maps() {
        let json = serde_json::json!({
            "symbol": "PF_XBTUSD",
            "orderType": "take_profit",
            "stopPrice": 120000.0
        });

        let order: OpenOrder = serde_json::from_value(json).unwrap();
        assert_eq!(order.to_raw_order().unwrap().kind, OrderKind::TakeProfit);
    }

    #[test]
    fn test_limit_order_maps_to_nothing() {
        let json = serde_json::json!({
            "symbol": "PF_XBTUSD",
            "orderType": "lmt",
            "stopPrice": null
        });

        let order: OpenOrder = serde_json::from_value(json).unwrap();
        assert!(order.to_raw_order().is_none());
    }
}
