//! Position model shared across the monitor.
//!
//! All financial values use `rust_decimal::Decimal` for precision. A position
//! is uniquely identified by `(platform, symbol, side)` within one cycle;
//! positions are rebuilt from scratch every cycle and carry no identity
//! across cycles.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Exchange account a position was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    BingX,
    Blofin,
    Kraken,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BingX => write!(f, "BingX"),
            Self::Blofin => write!(f, "Blofin"),
            Self::Kraken => write!(f, "Kraken"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BingX" => Ok(Self::BingX),
            "Blofin" => Ok(Self::Blofin),
            "Kraken" => Ok(Self::Kraken),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Direction of a leveraged position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "LONG")]
    Long,
    #[serde(rename = "SHORT")]
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// Coarse trend classification derived from leverage-adjusted PnL%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStatus {
    Uptrend,
    Downtrend,
    Sideways,
}

impl std::fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Risk classification, evaluated in priority order (first match wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFlag {
    /// Margin share of portfolio above 15% with no stop loss.
    #[serde(rename = "HIGH_RISK_NO_SL")]
    HighRiskNoSl,

    /// Margin share of portfolio above 25%, regardless of stop loss.
    #[serde(rename = "LARGE_POSITION")]
    LargePosition,

    /// No stop loss set (weaker than the two above).
    #[serde(rename = "NO_STOP_LOSS")]
    NoStopLoss,

    /// None of the above fired.
    #[serde(rename = "MANAGED_RISK")]
    ManagedRisk,
}

impl std::fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::HighRiskNoSl => "HIGH_RISK_NO_SL",
            Self::LargePosition => "LARGE_POSITION",
            Self::NoStopLoss => "NO_STOP_LOSS",
            Self::ManagedRisk => "MANAGED_RISK",
        };
        write!(f, "{name}")
    }
}

/// Four-way classification of which triggers a position carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TpSlStatus {
    #[serde(rename = "Both TP & SL set")]
    BothSet,
    #[serde(rename = "Only TP set")]
    OnlyTp,
    #[serde(rename = "Only SL set")]
    OnlySl,
    #[serde(rename = "Neither set")]
    NeitherSet,
}

// =============================================================================
// Position
// =============================================================================

/// Identity of a position within one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub platform: Platform,
    pub symbol: String,
    pub side: Side,
}

/// One open leveraged position, normalized across exchanges.
///
/// Base fields come from the exchange; trigger prices are joined in from the
/// open-order list (`0` means unset); derived fields are populated by the
/// risk metrics pass and are zero/neutral until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub platform: Platform,
    pub symbol: String,
    pub side: Side,

    /// Average entry price as reported by the exchange for this cycle.
    pub entry_price: Decimal,

    /// Mark price, refreshed every cycle.
    pub mark_price: Decimal,

    /// Leverage multiplier; defaults to 1 when unreported.
    pub leverage: Decimal,

    /// Notional value of the position in quote currency.
    pub notional: Decimal,

    /// Contract size or token amount.
    pub amount: Decimal,

    /// Stop-loss trigger price; `0` = unset.
    pub sl_price: Decimal,

    /// Take-profit trigger price; `0` = unset.
    pub tp_price: Decimal,

    /// Entry timestamp when the exchange reports one.
    pub created_at: Option<DateTime<Utc>>,

    // ---- derived fields (risk metrics pass) ----
    /// Capital allocated to the position: notional / leverage.
    pub margin_size: Decimal,

    /// Leverage-adjusted unrealized PnL in percent.
    pub unrealized_pnl_pct: Decimal,

    /// Unrealized PnL in quote currency.
    pub unrealized_pnl_abs: Decimal,

    /// Side-aware percentage gap from mark price to TP; `0` when TP unset.
    pub distance_to_tp_pct: Decimal,

    /// Side-aware percentage gap from mark price to SL; `0` when SL unset.
    pub distance_to_sl_pct: Decimal,

    /// This position's margin as a share of total portfolio margin.
    pub margin_pct_of_portfolio: Decimal,

    /// Heuristic 15-85 momentum score derived from PnL%, not a real RSI.
    pub rsi_proxy: Decimal,

    pub trend_status: TrendStatus,

    pub risk_flag: RiskFlag,

    /// Reward/risk ratio from trigger distances; `None` unless both triggers
    /// are set and the SL distance is nonzero.
    pub risk_reward: Option<Decimal>,
}

impl Position {
    /// Creates a position with all numeric fields zeroed and neutral
    /// classifications. The normalizer fills base fields; the metrics pass
    /// fills derived ones.
    #[must_use]
    pub fn new(platform: Platform, symbol: impl Into<String>, side: Side) -> Self {
        Self {
            platform,
            symbol: symbol.into(),
            side,
            entry_price: Decimal::ZERO,
            mark_price: Decimal::ZERO,
            leverage: Decimal::ONE,
            notional: Decimal::ZERO,
            amount: Decimal::ZERO,
            sl_price: Decimal::ZERO,
            tp_price: Decimal::ZERO,
            created_at: None,
            margin_size: Decimal::ZERO,
            unrealized_pnl_pct: Decimal::ZERO,
            unrealized_pnl_abs: Decimal::ZERO,
            distance_to_tp_pct: Decimal::ZERO,
            distance_to_sl_pct: Decimal::ZERO,
            margin_pct_of_portfolio: Decimal::ZERO,
            rsi_proxy: Decimal::from(50),
            trend_status: TrendStatus::Sideways,
            risk_flag: RiskFlag::ManagedRisk,
            risk_reward: None,
        }
    }

    /// Identity tuple for set semantics downstream.
    #[must_use]
    pub fn key(&self) -> PositionKey {
        PositionKey {
            platform: self.platform,
            symbol: self.symbol.clone(),
            side: self.side,
        }
    }

    #[must_use]
    pub fn sl_set(&self) -> bool {
        self.sl_price > Decimal::ZERO
    }

    #[must_use]
    pub fn tp_set(&self) -> bool {
        self.tp_price > Decimal::ZERO
    }

    #[must_use]
    pub fn tp_sl_status(&self) -> TpSlStatus {
        match (self.tp_set(), self.sl_set()) {
            (true, true) => TpSlStatus::BothSet,
            (true, false) => TpSlStatus::OnlyTp,
            (false, true) => TpSlStatus::OnlySl,
            (false, false) => TpSlStatus::NeitherSet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_platform_display_roundtrip() {
        for platform in [Platform::BingX, Platform::Blofin, Platform::Kraken] {
            let parsed: Platform = platform.to_string().parse().unwrap();
            assert_eq!(parsed, platform);
        }
        assert!("Binance".parse::<Platform>().is_err());
    }

    #[test]
    fn test_side_serde_wire_names() {
        assert_eq!(serde_json::to_string(&Side::Long).unwrap(), "\"LONG\"");
        assert_eq!(serde_json::to_string(&Side::Short).unwrap(), "\"SHORT\"");
    }

    #[test]
    fn test_risk_flag_wire_names() {
        assert_eq!(
            serde_json::to_string(&RiskFlag::HighRiskNoSl).unwrap(),
            "\"HIGH_RISK_NO_SL\""
        );
        assert_eq!(
            serde_json::to_string(&RiskFlag::ManagedRisk).unwrap(),
            "\"MANAGED_RISK\""
        );
    }

    #[test]
    fn test_tp_sl_status_classification() {
        let mut pos = Position::new(Platform::BingX, "BTC-USDT", Side::Long);
        assert_eq!(pos.tp_sl_status(), TpSlStatus::NeitherSet);

        pos.tp_price = dec!(120000);
        assert_eq!(pos.tp_sl_status(), TpSlStatus::OnlyTp);

        pos.sl_price = dec!(95000);
        assert_eq!(pos.tp_sl_status(), TpSlStatus::BothSet);

        pos.tp_price = Decimal::ZERO;
        assert_eq!(pos.tp_sl_status(), TpSlStatus::OnlySl);
    }

    #[test]
    fn test_new_position_is_neutral() {
        let pos = Position::new(Platform::Kraken, "ETH/USD", Side::Short);
        assert_eq!(pos.leverage, Decimal::ONE);
        assert_eq!(pos.rsi_proxy, dec!(50));
        assert_eq!(pos.trend_status, TrendStatus::Sideways);
        assert_eq!(pos.risk_flag, RiskFlag::ManagedRisk);
        assert!(pos.risk_reward.is_none());
    }

    #[test]
    fn test_key_distinguishes_sides() {
        let long = Position::new(Platform::Blofin, "SOL-USDT", Side::Long);
        let short = Position::new(Platform::Blofin, "SOL-USDT", Side::Short);
        assert_ne!(long.key(), short.key());
    }
}
