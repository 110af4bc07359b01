//! Alert records produced by the rule engine.
//!
//! Alerts are ephemeral: generated fresh every cycle, never merged with or
//! deduplicated against prior cycles. A position violating the same rule
//! every hour regenerates the same alert every hour.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::position::Platform;

/// The fixed set of rule outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overbought,
    Oversold,
    LosingTrade,
    NoStopLoss,
    HighProfit,
}

impl AlertKind {
    /// Short label used in delivery summaries.
    #[must_use]
    pub fn summary_label(&self) -> &'static str {
        match self {
            Self::Overbought => "Overbought",
            Self::Oversold => "Oversold",
            Self::LosingTrade => "Losing",
            Self::NoStopLoss => "No SL",
            Self::HighProfit => "High Profit",
        }
    }
}

/// One alert for one position, with whichever numeric context the rule used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub symbol: String,
    pub platform: Platform,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl_pct: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_proxy: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_size: Option<Decimal>,

    /// Human-readable one-liner for delivery.
    pub message: String,
}

/// One cycle's worth of alerts, grouped for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertBatch {
    pub generated_at: DateTime<Utc>,
    pub total_alerts: usize,

    /// Per-kind counts; map keys serialize as the snake_case kind names.
    pub counts: BTreeMap<AlertKind, usize>,

    pub alerts: Vec<Alert>,

    /// Pre-rendered summary lines ("Overbought: 2", ...), in kind order.
    pub summary_lines: Vec<String>,
}

impl AlertBatch {
    /// Groups a cycle's alerts into a delivery batch.
    #[must_use]
    pub fn from_alerts(alerts: Vec<Alert>) -> Self {
        let mut counts: BTreeMap<AlertKind, usize> = BTreeMap::new();
        for alert in &alerts {
            *counts.entry(alert.kind).or_insert(0) += 1;
        }

        let summary_lines = counts
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind.summary_label(), count))
            .collect();

        Self {
            generated_at: Utc::now(),
            total_alerts: alerts.len(),
            counts,
            alerts,
            summary_lines,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_alert(kind: AlertKind, symbol: &str) -> Alert {
        Alert {
            kind,
            symbol: symbol.to_string(),
            platform: Platform::BingX,
            pnl_pct: Some(dec!(-12.5)),
            rsi_proxy: None,
            margin_size: None,
            message: format!("{symbol} test alert"),
        }
    }

    #[test]
    fn test_batch_counts_by_kind() {
        let batch = AlertBatch::from_alerts(vec![
            make_alert(AlertKind::LosingTrade, "BTC-USDT"),
            make_alert(AlertKind::LosingTrade, "ETH-USDT"),
            make_alert(AlertKind::HighProfit, "SOL-USDT"),
        ]);

        assert_eq!(batch.total_alerts, 3);
        assert_eq!(batch.counts[&AlertKind::LosingTrade], 2);
        assert_eq!(batch.counts[&AlertKind::HighProfit], 1);
        assert!(!batch.counts.contains_key(&AlertKind::Overbought));
    }

    #[test]
    fn test_batch_summary_lines() {
        let batch = AlertBatch::from_alerts(vec![
            make_alert(AlertKind::Overbought, "BTC-USDT"),
            make_alert(AlertKind::NoStopLoss, "ETH-USDT"),
            make_alert(AlertKind::NoStopLoss, "XRP-USDT"),
        ]);

        assert!(batch.summary_lines.contains(&"Overbought: 1".to_string()));
        assert!(batch.summary_lines.contains(&"No SL: 2".to_string()));
    }

    #[test]
    fn test_empty_batch() {
        let batch = AlertBatch::from_alerts(vec![]);
        assert!(batch.is_empty());
        assert_eq!(batch.total_alerts, 0);
        assert!(batch.summary_lines.is_empty());
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&AlertKind::LosingTrade).unwrap(),
            "\"losing_trade\""
        );
        assert_eq!(
            serde_json::to_string(&AlertKind::NoStopLoss).unwrap(),
            "\"no_stop_loss\""
        );
    }

    #[test]
    fn test_batch_json_counts_keys() {
        let batch = AlertBatch::from_alerts(vec![make_alert(AlertKind::Oversold, "BTC-USDT")]);
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["counts"]["oversold"], 1);
    }
}
