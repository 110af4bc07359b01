//! Full-cycle integration tests against mock collaborators.
//!
//! All fixture data is generated here; nothing in the production crates can
//! reach it.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use perp_sentry_core::alert::{AlertBatch, AlertKind};
use perp_sentry_core::position::{Platform, Side};
use perp_sentry_core::raw::{OrderKind, RawOrder, RawPosition};
use perp_sentry_core::traits::{AlertSink, Article, ExchangeConnector, NewsFilter, NewsProvider};
use perp_sentry_data::{SnapshotFormat, SnapshotStore};
use perp_sentry_engine::Monitor;

// =============================================================================
// Fixtures
// =============================================================================

fn raw_position(
    platform: Platform,
    symbol: &str,
    side: Side,
    entry: Decimal,
    mark: Decimal,
    leverage: Decimal,
    notional: Decimal,
) -> RawPosition {
    let mut raw = RawPosition::new(platform, symbol);
    raw.side = Some(side);
    raw.entry_price = Some(entry);
    raw.mark_price = Some(mark);
    raw.leverage = Some(leverage);
    raw.notional = Some(notional);
    raw.amount = Some(notional / mark.max(Decimal::ONE));
    raw
}

struct MockConnector {
    platform: Platform,
    positions: Vec<RawPosition>,
    orders: Vec<RawOrder>,
    fail: bool,
}

impl MockConnector {
    fn new(platform: Platform, positions: Vec<RawPosition>, orders: Vec<RawOrder>) -> Self {
        Self {
            platform,
            positions,
            orders,
            fail: false,
        }
    }

    fn failing(platform: Platform) -> Self {
        Self {
            platform,
            positions: Vec::new(),
            orders: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl ExchangeConnector for MockConnector {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_positions(&self) -> Result<Vec<RawPosition>> {
        if self.fail {
            return Err(anyhow!("simulated exchange outage"));
        }
        Ok(self.positions.clone())
    }

    async fn fetch_open_orders(&self) -> Result<Vec<RawOrder>> {
        if self.fail {
            return Err(anyhow!("simulated exchange outage"));
        }
        Ok(self.orders.clone())
    }
}

/// Cloneable sink; every clone shares the same delivered-batch log.
#[derive(Clone)]
struct CollectingSink {
    batches: Arc<Mutex<Vec<AlertBatch>>>,
}

impl CollectingSink {
    fn new() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn delivered(&self) -> Vec<AlertBatch> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for CollectingSink {
    fn name(&self) -> &str {
        "collector"
    }

    async fn deliver(&self, batch: &AlertBatch) -> Result<()> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

struct StaticNews;

#[async_trait]
impl NewsProvider for StaticNews {
    async fn fetch_news(&self, filter: &NewsFilter) -> Result<Vec<Article>> {
        Ok(vec![Article {
            title: "Exchange outage resolved".to_string(),
            source: "wire".to_string(),
            url: "https://example.com/a".to_string(),
            published_at: None,
            matched_symbol: filter.symbols.first().cloned(),
        }])
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_full_cycle_produces_snapshots_and_alerts() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let bingx = MockConnector::new(
        Platform::BingX,
        vec![
            // losing trade: pnl = -10% at 1x
            raw_position(
                Platform::BingX,
                "ETH-USDT",
                Side::Long,
                dec!(100),
                dec!(90),
                Decimal::ONE,
                dec!(60),
            ),
            // quiet winner with protective stop
            raw_position(
                Platform::BingX,
                "BTC-USDT",
                Side::Long,
                dec!(100),
                dec!(105),
                Decimal::ONE,
                dec!(40),
            ),
        ],
        vec![RawOrder {
            platform: Platform::BingX,
            symbol: "BTC-USDT".to_string(),
            kind: OrderKind::Stop,
            trigger_price: dec!(95),
        }],
    );

    let sink = CollectingSink::new();
    let monitor = Monitor::new(
        vec![Box::new(bingx)],
        store.clone(),
        vec![Box::new(sink.clone())],
        3,
    );

    let report = monitor.run_cycle().await;

    assert_eq!(report.total_positions, 2);
    assert_eq!(report.positions_per_platform["BingX"], 2);
    assert_eq!(report.total_margin, dec!(100));
    assert_eq!(report.alert_count, 1);
    assert_eq!(report.snapshot_paths.len(), 2);

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].alerts[0].kind, AlertKind::LosingTrade);

    // snapshots landed in both formats and carry the enriched fields
    let loaded = store.latest(SnapshotFormat::Csv).unwrap().unwrap();
    assert_eq!(loaded.len(), 2);
    let eth = loaded.iter().find(|p| p.symbol == "ETH-USDT").unwrap();
    assert_eq!(eth.unrealized_pnl_pct, dec!(-10));
    assert_eq!(eth.margin_pct_of_portfolio, dec!(60));

    let btc = loaded.iter().find(|p| p.symbol == "BTC-USDT").unwrap();
    assert_eq!(btc.sl_price, dec!(95));
    assert!(store.latest(SnapshotFormat::Json).unwrap().is_some());
}

#[tokio::test]
async fn test_failing_exchange_is_isolated() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let healthy = MockConnector::new(
        Platform::Blofin,
        vec![raw_position(
            Platform::Blofin,
            "SOL-USDT",
            Side::Short,
            dec!(200),
            dec!(200),
            dec!(2),
            dec!(100),
        )],
        vec![],
    );

    let monitor = Monitor::new(
        vec![Box::new(MockConnector::failing(Platform::BingX)), Box::new(healthy)],
        store,
        vec![],
        3,
    );

    let report = monitor.run_cycle().await;

    // the failing exchange contributes zero positions, the healthy one is
    // unaffected
    assert_eq!(report.positions_per_platform["BingX"], 0);
    assert_eq!(report.positions_per_platform["Blofin"], 1);
    assert_eq!(report.total_positions, 1);
}

#[tokio::test]
async fn test_quiet_cycle_skips_delivery() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let connector = MockConnector::new(
        Platform::Kraken,
        vec![raw_position(
            Platform::Kraken,
            "PF_XBTUSD",
            Side::Long,
            dec!(100),
            dec!(102),
            Decimal::ONE,
            dec!(50),
        )],
        vec![RawOrder {
            platform: Platform::Kraken,
            symbol: "PF_XBTUSD".to_string(),
            kind: OrderKind::Stop,
            trigger_price: dec!(95),
        }],
    );

    let sink = CollectingSink::new();
    let monitor = Monitor::new(
        vec![Box::new(connector)],
        store,
        vec![Box::new(sink.clone())],
        3,
    );
    let report = monitor.run_cycle().await;

    assert_eq!(report.alert_count, 0);
    assert!(sink.delivered().is_empty());
}

#[tokio::test]
async fn test_alert_batch_reaches_every_sink() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let connector = MockConnector::new(
        Platform::BingX,
        vec![
            // deep loss, large margin, no stop: three alerts
            raw_position(
                Platform::BingX,
                "DOGE-USDT",
                Side::Long,
                dec!(100),
                dec!(70),
                Decimal::ONE,
                dec!(300),
            ),
        ],
        vec![],
    );

    let sink_a = CollectingSink::new();
    let sink_b = CollectingSink::new();

    let monitor = Monitor::new(
        vec![Box::new(connector)],
        store,
        vec![Box::new(sink_a.clone()), Box::new(sink_b.clone())],
        3,
    );

    let report = monitor.run_cycle().await;
    assert_eq!(report.alert_count, 3);

    for sink in [&sink_a, &sink_b] {
        let batches = sink.delivered();
        assert_eq!(batches.len(), 1);
        let kinds: Vec<AlertKind> = batches[0].alerts.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AlertKind::Oversold));
        assert!(kinds.contains(&AlertKind::LosingTrade));
        assert!(kinds.contains(&AlertKind::NoStopLoss));
    }
}

#[tokio::test]
async fn test_news_lines_appended_to_batch() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let connector = MockConnector::new(
        Platform::Blofin,
        vec![raw_position(
            Platform::Blofin,
            "ETH-USDT",
            Side::Long,
            dec!(100),
            dec!(85),
            Decimal::ONE,
            dec!(50),
        )],
        vec![],
    );

    let sink = CollectingSink::new();
    let monitor = Monitor::new(
        vec![Box::new(connector)],
        store,
        vec![Box::new(sink.clone())],
        3,
    )
    .with_news_provider(Box::new(StaticNews));

    monitor.run_cycle().await;

    let batches = sink.delivered();
    assert_eq!(batches.len(), 1);
    assert!(batches[0]
        .summary_lines
        .iter()
        .any(|line| line.starts_with("News (wire):")));
}

#[tokio::test]
async fn test_retention_applied_across_cycles() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let monitor = Monitor::new(
        vec![Box::new(MockConnector::new(Platform::BingX, vec![], vec![]))],
        store.clone(),
        vec![],
        2,
    );

    for _ in 0..4 {
        monitor.run_cycle().await;
        // snapshots within one minute get suffixed names; spread mtimes so
        // retention ordering is deterministic
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    let count = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("csv"))
        .count();
    assert_eq!(count, 2);
}
