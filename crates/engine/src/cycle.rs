//! One monitoring cycle: fetch, normalize, enrich, evaluate, persist,
//! deliver.
//!
//! The cycle is single-threaded and cooperative; per-exchange fetches run
//! sequentially and a failing exchange degrades to an empty result set for
//! that cycle instead of propagating. Nothing in a cycle is fatal: snapshot
//! failures do not block delivery, sink failures do not block each other,
//! and the cycle always returns a report.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info, warn};

use perp_sentry_core::alert::AlertBatch;
use perp_sentry_core::position::{Platform, Position};
use perp_sentry_core::traits::{AlertSink, ExchangeConnector, NewsFilter, NewsProvider};
use perp_sentry_data::{SnapshotFormat, SnapshotStore};

use crate::{metrics, normalizer, rules};

/// Cap on news summary lines appended to one delivery batch.
const MAX_NEWS_LINES: usize = 5;

/// End-of-cycle summary handed back to the caller.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub positions_per_platform: BTreeMap<String, usize>,
    pub total_positions: usize,
    pub total_margin: Decimal,
    pub alert_count: usize,
    pub snapshot_paths: Vec<PathBuf>,
}

/// Owns the collaborators for the monitoring pipeline and runs cycles over
/// them.
pub struct Monitor {
    connectors: Vec<Box<dyn ExchangeConnector>>,
    store: SnapshotStore,
    sinks: Vec<Box<dyn AlertSink>>,
    news: Option<Box<dyn NewsProvider>>,
    keep_count: usize,
}

impl Monitor {
    #[must_use]
    pub fn new(
        connectors: Vec<Box<dyn ExchangeConnector>>,
        store: SnapshotStore,
        sinks: Vec<Box<dyn AlertSink>>,
        keep_count: usize,
    ) -> Self {
        Self {
            connectors,
            store,
            sinks,
            news: None,
            keep_count,
        }
    }

    /// Attaches the optional news collaborator.
    #[must_use]
    pub fn with_news_provider(mut self, provider: Box<dyn NewsProvider>) -> Self {
        self.news = Some(provider);
        self
    }

    /// Runs one full cycle. Never fails: every error along the way is
    /// logged and degraded per the error taxonomy.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut positions = Vec::new();
        let mut per_platform: BTreeMap<String, usize> = BTreeMap::new();

        for connector in &self.connectors {
            let platform = connector.platform();
            let normalized = self.fetch_and_normalize(connector.as_ref(), platform).await;

            info!(
                platform = %platform,
                count = normalized.len(),
                "Normalized positions"
            );
            per_platform.insert(platform.to_string(), normalized.len());
            positions.extend(normalized);
        }

        let positions = metrics::enrich_all(positions);
        let total_margin: Decimal = positions.iter().map(|p| p.margin_size).sum();

        let alerts = rules::evaluate_all(&positions);
        let mut batch = rules::build_batch(alerts);

        if let Some(news) = &self.news {
            self.append_news_lines(news.as_ref(), &positions, &mut batch).await;
        }

        let snapshot_paths = self.persist(&positions);

        if batch.is_empty() {
            info!("No alerts triggered, all positions within normal parameters");
        } else {
            info!(count = batch.total_alerts, "Delivering alert batch");
            for sink in &self.sinks {
                if let Err(e) = sink.deliver(&batch).await {
                    warn!(sink = sink.name(), error = %e, "Alert delivery failed");
                }
            }
        }

        CycleReport {
            positions_per_platform: per_platform,
            total_positions: positions.len(),
            total_margin,
            alert_count: batch.total_alerts,
            snapshot_paths,
        }
    }

    /// Fetches one exchange, degrading any failure to an empty set.
    async fn fetch_and_normalize(
        &self,
        connector: &dyn ExchangeConnector,
        platform: Platform,
    ) -> Vec<Position> {
        let raw_positions = match connector.fetch_positions().await {
            Ok(p) => p,
            Err(e) => {
                warn!(platform = %platform, error = %e, "Position fetch failed, treating as empty");
                Vec::new()
            }
        };

        let raw_orders = match connector.fetch_open_orders().await {
            Ok(o) => o,
            Err(e) => {
                warn!(platform = %platform, error = %e, "Order fetch failed, SL/TP left unset");
                Vec::new()
            }
        };

        normalizer::normalize(platform, &raw_positions, &raw_orders)
    }

    /// Writes both snapshot formats and applies retention; failures are
    /// logged so alerting is never blocked by storage issues.
    fn persist(&self, positions: &[Position]) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for format in SnapshotFormat::ALL {
            match self.store.save(positions, format) {
                Ok(path) => paths.push(path),
                Err(e) => error!(error = %e, "Snapshot write failed"),
            }
        }

        if let Err(e) = self.store.prune(self.keep_count) {
            warn!(error = %e, "Snapshot retention failed");
        }

        paths
    }

    async fn append_news_lines(
        &self,
        news: &dyn NewsProvider,
        positions: &[Position],
        batch: &mut AlertBatch,
    ) {
        let mut symbols: Vec<String> = positions.iter().map(|p| p.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();

        let filter = NewsFilter {
            symbols,
            max_items: MAX_NEWS_LINES,
        };

        match news.fetch_news(&filter).await {
            Ok(articles) => {
                for article in articles.iter().take(MAX_NEWS_LINES) {
                    batch
                        .summary_lines
                        .push(format!("News ({}): {}", article.source, article.title));
                }
            }
            Err(e) => warn!(error = %e, "News fetch failed, skipping news lines"),
        }
    }
}
