//! Pure per-position risk heuristics.
//!
//! These functions are deterministic over their inputs and shared by the
//! metrics pass and the snapshot loader (which re-derives non-persisted
//! fields). All guards resolve to neutral defaults rather than errors.

use rust_decimal::Decimal;

use crate::position::{RiskFlag, TrendStatus};

/// Heuristic momentum score derived algebraically from leverage-adjusted
/// PnL%, clamped to `[15, 85]`. Not a time-series RSI.
///
/// Piecewise: above +25% PnL the score accelerates at 1.2x and caps at 85;
/// below -15% it accelerates at 1.8x and floors at 15; in between it moves
/// at 0.6x around the neutral 50. Arithmetic overflow yields neutral 50.
#[must_use]
pub fn rsi_proxy(pnl_pct: Decimal) -> Decimal {
    let neutral = Decimal::from(50);

    let score = if pnl_pct > Decimal::from(25) {
        pnl_pct
            .checked_mul(Decimal::new(12, 1))
            .and_then(|v| neutral.checked_add(v))
            .map(|v| v.min(Decimal::from(85)))
    } else if pnl_pct < Decimal::from(-15) {
        pnl_pct
            .checked_mul(Decimal::new(18, 1))
            .and_then(|v| neutral.checked_add(v))
            .map(|v| v.max(Decimal::from(15)))
    } else {
        pnl_pct
            .checked_mul(Decimal::new(6, 1))
            .and_then(|v| neutral.checked_add(v))
    };

    score.unwrap_or(neutral)
}

/// Trend classification from leverage-adjusted PnL%.
///
/// Both boundaries are exclusive: exactly +30 or -20 classifies as Sideways.
#[must_use]
pub fn classify_trend(pnl_pct: Decimal) -> TrendStatus {
    if pnl_pct > Decimal::from(30) {
        TrendStatus::Uptrend
    } else if pnl_pct < Decimal::from(-20) {
        TrendStatus::Downtrend
    } else {
        TrendStatus::Sideways
    }
}

/// Risk classification in priority order; first match wins.
#[must_use]
pub fn classify_risk(margin_pct_of_portfolio: Decimal, sl_set: bool) -> RiskFlag {
    if margin_pct_of_portfolio > Decimal::from(15) && !sl_set {
        RiskFlag::HighRiskNoSl
    } else if margin_pct_of_portfolio > Decimal::from(25) {
        RiskFlag::LargePosition
    } else if !sl_set {
        RiskFlag::NoStopLoss
    } else {
        RiskFlag::ManagedRisk
    }
}

/// Reward/risk ratio from trigger distances: |TP - mark| / |mark - SL|.
///
/// `None` unless both triggers are set and the SL distance is nonzero.
#[must_use]
pub fn risk_reward(mark_price: Decimal, sl_price: Decimal, tp_price: Decimal) -> Option<Decimal> {
    if sl_price <= Decimal::ZERO || tp_price <= Decimal::ZERO {
        return None;
    }

    let distance_to_sl = (mark_price - sl_price).abs();
    if distance_to_sl.is_zero() {
        return None;
    }

    Some((tp_price - mark_price).abs() / distance_to_sl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // ==================== RSI Proxy Tests ====================

    #[test]
    fn test_rsi_neutral_zone() {
        assert_eq!(rsi_proxy(Decimal::ZERO), dec!(50));
        assert_eq!(rsi_proxy(dec!(-10)), dec!(44.0));
        assert_eq!(rsi_proxy(dec!(10)), dec!(56.0));
    }

    #[test]
    fn test_rsi_hot_zone_caps_at_85() {
        // 50 + 26 * 1.2 = 81.2
        assert_eq!(rsi_proxy(dec!(26)), dec!(81.2));
        // 50 + 30 * 1.2 = 86 -> capped
        assert_eq!(rsi_proxy(dec!(30)), dec!(85));
        assert_eq!(rsi_proxy(dec!(1000)), dec!(85));
    }

    #[test]
    fn test_rsi_cold_zone_floors_at_15() {
        // 50 + (-16) * 1.8 = 21.2
        assert_eq!(rsi_proxy(dec!(-16)), dec!(21.2));
        // 50 + (-20) * 1.8 = 14 -> floored
        assert_eq!(rsi_proxy(dec!(-20)), dec!(15));
        assert_eq!(rsi_proxy(dec!(-1000)), dec!(15));
    }

    #[test]
    fn test_rsi_monotonic_within_each_range() {
        let neutral = [dec!(-15), dec!(-8), dec!(0), dec!(12), dec!(25)];
        for pair in neutral.windows(2) {
            assert!(rsi_proxy(pair[0]) <= rsi_proxy(pair[1]));
        }

        let hot = [dec!(25.1), dec!(27), dec!(29), dec!(40)];
        for pair in hot.windows(2) {
            assert!(rsi_proxy(pair[0]) <= rsi_proxy(pair[1]));
        }

        let cold = [dec!(-50), dec!(-25), dec!(-18), dec!(-15.1)];
        for pair in cold.windows(2) {
            assert!(rsi_proxy(pair[0]) <= rsi_proxy(pair[1]));
        }
    }

    #[test]
    fn test_rsi_overflow_yields_neutral() {
        // the 1.2x/1.8x multiplications overflow at the Decimal extremes
        assert_eq!(rsi_proxy(Decimal::MAX), dec!(50));
        assert_eq!(rsi_proxy(Decimal::MIN), dec!(50));
    }

    // ==================== Trend Tests ====================

    #[test]
    fn test_trend_boundaries_are_exclusive() {
        assert_eq!(classify_trend(dec!(30)), TrendStatus::Sideways);
        assert_eq!(classify_trend(dec!(30.01)), TrendStatus::Uptrend);
        assert_eq!(classify_trend(dec!(-20)), TrendStatus::Sideways);
        assert_eq!(classify_trend(dec!(-20.01)), TrendStatus::Downtrend);
        assert_eq!(classify_trend(Decimal::ZERO), TrendStatus::Sideways);
    }

    // ==================== Risk Flag Tests ====================

    #[test]
    fn test_risk_flag_priority_order() {
        // >15% without SL wins over LargePosition even when >25%
        assert_eq!(classify_risk(dec!(30), false), RiskFlag::HighRiskNoSl);
        assert_eq!(classify_risk(dec!(16), false), RiskFlag::HighRiskNoSl);

        // >25% with SL is still a large position
        assert_eq!(classify_risk(dec!(26), true), RiskFlag::LargePosition);

        // small position without SL
        assert_eq!(classify_risk(dec!(5), false), RiskFlag::NoStopLoss);

        assert_eq!(classify_risk(dec!(5), true), RiskFlag::ManagedRisk);
        assert_eq!(classify_risk(dec!(15), false), RiskFlag::NoStopLoss);
        assert_eq!(classify_risk(dec!(25), true), RiskFlag::ManagedRisk);
    }

    // ==================== Risk/Reward Tests ====================

    #[test]
    fn test_risk_reward_requires_both_triggers() {
        assert!(risk_reward(dec!(100), Decimal::ZERO, dec!(120)).is_none());
        assert!(risk_reward(dec!(100), dec!(90), Decimal::ZERO).is_none());
    }

    #[test]
    fn test_risk_reward_ratio() {
        // TP 20 away, SL 10 away -> 2.0
        assert_eq!(risk_reward(dec!(100), dec!(90), dec!(120)), Some(dec!(2)));
        // short-style geometry gives the same absolute ratio
        assert_eq!(risk_reward(dec!(100), dec!(110), dec!(80)), Some(dec!(2)));
    }

    #[test]
    fn test_risk_reward_zero_sl_distance() {
        assert!(risk_reward(dec!(100), dec!(100), dec!(120)).is_none());
    }
}
