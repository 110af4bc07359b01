//! Position normalization: per-exchange raw records into the common model.
//!
//! Pure over its inputs. A malformed record (empty symbol, unparseable side)
//! is skipped with a warning and does not abort the rest of the batch;
//! missing numerics default to zero (leverage to 1). Trigger orders are
//! joined by exact symbol match: the first stop order found becomes the SL
//! and the first take-profit the TP, later duplicates are ignored.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

use perp_sentry_core::position::{Platform, Position};
use perp_sentry_core::raw::{OrderKind, RawOrder, RawPosition};

#[derive(Debug, Default, Clone, Copy)]
struct Triggers {
    sl: Option<Decimal>,
    tp: Option<Decimal>,
}

/// Maps one exchange's raw positions and open orders into normalized
/// positions. Output ordering carries no meaning; downstream stages treat
/// the result as a set keyed by `(platform, symbol, side)`.
#[must_use]
pub fn normalize(
    platform: Platform,
    raw_positions: &[RawPosition],
    raw_orders: &[RawOrder],
) -> Vec<Position> {
    let triggers = collect_triggers(platform, raw_orders);

    raw_positions
        .iter()
        .filter(|raw| raw.platform == platform)
        .filter_map(|raw| normalize_one(raw, &triggers))
        .collect()
}

/// First-wins SL/TP per symbol.
fn collect_triggers(platform: Platform, raw_orders: &[RawOrder]) -> HashMap<String, Triggers> {
    let mut map: HashMap<String, Triggers> = HashMap::new();

    for order in raw_orders.iter().filter(|o| o.platform == platform) {
        let entry = map.entry(order.symbol.clone()).or_default();
        match order.kind {
            OrderKind::Stop => {
                if entry.sl.is_none() {
                    entry.sl = Some(order.trigger_price);
                }
            }
            OrderKind::TakeProfit => {
                if entry.tp.is_none() {
                    entry.tp = Some(order.trigger_price);
                }
            }
        }
    }

    map
}

fn normalize_one(raw: &RawPosition, triggers: &HashMap<String, Triggers>) -> Option<Position> {
    if raw.symbol.is_empty() {
        warn!(platform = %raw.platform, "Skipping position with empty symbol");
        return None;
    }

    let Some(side) = raw.side else {
        warn!(
            platform = %raw.platform,
            symbol = %raw.symbol,
            "Skipping position with unrecognized side"
        );
        return None;
    };

    let mark_price = raw.mark_price.unwrap_or(Decimal::ZERO);
    let amount = raw.amount.unwrap_or(Decimal::ZERO).abs();

    let mut position = Position::new(raw.platform, raw.symbol.clone(), side);
    position.entry_price = raw.entry_price.unwrap_or(Decimal::ZERO);
    position.mark_price = mark_price;
    position.leverage = raw.leverage.unwrap_or(Decimal::ONE);
    // venues that report no notional get mark * |amount|
    position.notional = raw.notional.unwrap_or_else(|| mark_price * amount).abs();
    position.amount = amount;
    position.created_at = raw.created_at;

    let trigger = triggers.get(&raw.symbol).copied().unwrap_or_default();
    position.sl_price = trigger.sl.unwrap_or(Decimal::ZERO);
    position.tp_price = trigger.tp.unwrap_or(Decimal::ZERO);

    Some(position)
}
