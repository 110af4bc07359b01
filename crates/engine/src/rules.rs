//! The fixed alert rule table.
//!
//! Stateless and deterministic: one position in, zero or more alerts out.
//! Rules are independent except overbought/oversold, which are mutually
//! exclusive (oversold is only checked when overbought did not fire).
//! Positions with an empty symbol are skipped entirely.

use rust_decimal::Decimal;
use tracing::debug;

use perp_sentry_core::alert::{Alert, AlertBatch, AlertKind};
use perp_sentry_core::position::Position;

/// Evaluates one enriched position against the rule table.
#[must_use]
pub fn evaluate(position: &Position) -> Vec<Alert> {
    if position.symbol.is_empty() {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    let symbol = &position.symbol;
    let rsi = position.rsi_proxy;
    let pnl = position.unrealized_pnl_pct;
    let margin = position.margin_size;

    if rsi > Decimal::from(72) {
        alerts.push(Alert {
            kind: AlertKind::Overbought,
            symbol: symbol.clone(),
            platform: position.platform,
            pnl_pct: Some(pnl),
            rsi_proxy: Some(rsi),
            margin_size: None,
            message: format!(
                "{symbol} RSI is {}. Consider exiting or trailing stop.",
                rsi.round_dp(1)
            ),
        });
    } else if rsi < Decimal::from(28) {
        alerts.push(Alert {
            kind: AlertKind::Oversold,
            symbol: symbol.clone(),
            platform: position.platform,
            pnl_pct: Some(pnl),
            rsi_proxy: Some(rsi),
            margin_size: None,
            message: format!(
                "{symbol} is oversold at RSI {}. Clean reversal setup detected.",
                rsi.round_dp(1)
            ),
        });
    }

    if pnl < Decimal::from(-8) {
        alerts.push(Alert {
            kind: AlertKind::LosingTrade,
            symbol: symbol.clone(),
            platform: position.platform,
            pnl_pct: Some(pnl),
            rsi_proxy: None,
            margin_size: Some(margin),
            message: format!(
                "{symbol} is down {}%. Capital preservation - review position.",
                pnl.round_dp(1)
            ),
        });
    }

    if margin > Decimal::from(150) && !position.sl_set() {
        alerts.push(Alert {
            kind: AlertKind::NoStopLoss,
            symbol: symbol.clone(),
            platform: position.platform,
            pnl_pct: None,
            rsi_proxy: None,
            margin_size: Some(margin),
            message: format!(
                "{symbol} position (${}) needs a stop loss for fast rotation.",
                margin.round_dp(0)
            ),
        });
    }

    if pnl >= Decimal::from(35) {
        alerts.push(Alert {
            kind: AlertKind::HighProfit,
            symbol: symbol.clone(),
            platform: position.platform,
            pnl_pct: Some(pnl),
            rsi_proxy: None,
            margin_size: None,
            message: format!(
                "{symbol} up {}%. Consider rotating or trailing stops.",
                pnl.round_dp(1)
            ),
        });
    }

    alerts
}

/// Evaluates a whole cycle's position set; a position that yields nothing
/// never blocks the rest.
#[must_use]
pub fn evaluate_all(positions: &[Position]) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for position in positions {
        let found = evaluate(position);
        if !found.is_empty() {
            debug!(
                symbol = %position.symbol,
                platform = %position.platform,
                count = found.len(),
                "Position triggered alerts"
            );
        }
        alerts.extend(found);
    }
    alerts
}

/// Groups a cycle's alerts for delivery.
#[must_use]
pub fn build_batch(alerts: Vec<Alert>) -> AlertBatch {
    AlertBatch::from_alerts(alerts)
}
