//! Derived risk metrics over normalized positions.
//!
//! Formula reference (side-aware where noted):
//! - margin_size = notional / leverage
//! - unrealized_pnl_pct = signed(mark - entry) / entry * leverage * 100
//! - unrealized_pnl_abs = pnl_pct / 100 * margin_size
//! - distance to trigger = signed gap from mark price in percent
//! - margin_pct_of_portfolio = margin_size / portfolio_total * 100
//!
//! Every division guards the zero denominator by yielding zero for the
//! affected field instead of erroring.

use rust_decimal::Decimal;

use perp_sentry_core::position::{Position, Side};
use perp_sentry_core::risk;

/// Capital allocated to a position: notional / leverage, zero when leverage
/// is not positive.
#[must_use]
pub fn margin_size(notional: Decimal, leverage: Decimal) -> Decimal {
    if leverage > Decimal::ZERO {
        notional / leverage
    } else {
        Decimal::ZERO
    }
}

/// Leverage-adjusted unrealized PnL in percent, signed by side.
#[must_use]
pub fn unrealized_pnl_pct(
    side: Side,
    entry_price: Decimal,
    mark_price: Decimal,
    leverage: Decimal,
) -> Decimal {
    if entry_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let delta = match side {
        Side::Long => mark_price - entry_price,
        Side::Short => entry_price - mark_price,
    };

    delta / entry_price * leverage * Decimal::from(100)
}

/// Side-aware percentage gap from mark price to a trigger. Zero when the
/// trigger is unset or the mark price is zero. For a long, a TP above the
/// mark is a positive distance; for a short the inequality reverses.
#[must_use]
pub fn distance_pct(side: Side, mark_price: Decimal, trigger_price: Decimal) -> Decimal {
    if trigger_price <= Decimal::ZERO || mark_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let delta = match side {
        Side::Long => trigger_price - mark_price,
        Side::Short => mark_price - trigger_price,
    };

    delta / mark_price * Decimal::from(100)
}

/// Returns a copy of the position with all derived fields populated,
/// given the portfolio's total margin for the share calculation.
#[must_use]
pub fn enrich(position: &Position, portfolio_total_margin: Decimal) -> Position {
    let mut enriched = position.clone();

    enriched.margin_size = margin_size(position.notional, position.leverage);
    enriched.unrealized_pnl_pct = unrealized_pnl_pct(
        position.side,
        position.entry_price,
        position.mark_price,
        position.leverage,
    );
    enriched.unrealized_pnl_abs =
        enriched.unrealized_pnl_pct / Decimal::from(100) * enriched.margin_size;

    enriched.distance_to_tp_pct = distance_pct(position.side, position.mark_price, position.tp_price);
    enriched.distance_to_sl_pct = distance_pct(position.side, position.mark_price, position.sl_price);

    enriched.margin_pct_of_portfolio = if portfolio_total_margin > Decimal::ZERO {
        enriched.margin_size / portfolio_total_margin * Decimal::from(100)
    } else {
        Decimal::ZERO
    };

    enriched.rsi_proxy = risk::rsi_proxy(enriched.unrealized_pnl_pct);
    enriched.trend_status = risk::classify_trend(enriched.unrealized_pnl_pct);
    enriched.risk_flag = risk::classify_risk(enriched.margin_pct_of_portfolio, enriched.sl_set());
    enriched.risk_reward =
        risk::risk_reward(position.mark_price, position.sl_price, position.tp_price);

    enriched
}

/// Enriches a whole cycle's position set. The portfolio total margin is
/// computed over the combined set first, then applied to every position.
#[must_use]
pub fn enrich_all(positions: Vec<Position>) -> Vec<Position> {
    let total: Decimal = positions
        .iter()
        .map(|p| margin_size(p.notional, p.leverage))
        .sum();

    positions.iter().map(|p| enrich(p, total)).collect()
}
