use anyhow::{Context, Result};
use tracing::{info, warn};

use perp_sentry_bingx::BingxConnector;
use perp_sentry_blofin::BlofinConnector;
use perp_sentry_core::traits::{AlertSink, ExchangeConnector};
use perp_sentry_core::{AppConfig, ConfigLoader};
use perp_sentry_data::{SnapshotFormat, SnapshotStore};
use perp_sentry_engine::Monitor;
use perp_sentry_kraken::KrakenConnector;
use perp_sentry_notify::{DiscordWebhookSink, FileAlertSink};

pub fn load_config(path: &str) -> Result<AppConfig> {
    ConfigLoader::load_from(path).with_context(|| format!("loading config from {path}"))
}

/// Wires connectors, store, and sinks from the loaded configuration.
pub fn build_monitor(config: &AppConfig) -> Result<Monitor> {
    let mut connectors: Vec<Box<dyn ExchangeConnector>> = Vec::new();

    if config.bingx.enabled {
        connectors.push(Box::new(
            BingxConnector::from_credentials(&config.bingx).context("building BingX connector")?,
        ));
    }
    if config.blofin.enabled {
        connectors.push(Box::new(
            BlofinConnector::from_credentials(&config.blofin)
                .context("building Blofin connector")?,
        ));
    }
    if config.kraken.enabled {
        connectors.push(Box::new(
            KrakenConnector::from_credentials(&config.kraken)
                .context("building Kraken connector")?,
        ));
    }

    if connectors.is_empty() {
        warn!("No exchange is enabled in the configuration; cycles will be empty");
    }

    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    if let Some(path) = &config.alerts.alerts_file {
        sinks.push(Box::new(FileAlertSink::new(path)));
    }
    if let Some(url) = &config.alerts.webhook_url {
        sinks.push(Box::new(DiscordWebhookSink::new(url)));
    }

    let store = SnapshotStore::new(&config.monitor.snapshot_dir);

    Ok(Monitor::new(
        connectors,
        store,
        sinks,
        config.monitor.keep_count,
    ))
}

/// Runs cycles forever on the configured interval. The first cycle starts
/// immediately.
pub async fn run_scheduled(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let monitor = build_monitor(&config)?;

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(config.monitor.interval_secs));

    info!(
        interval_secs = config.monitor.interval_secs,
        "Starting scheduled monitoring"
    );

    loop {
        interval.tick().await;
        let report = monitor.run_cycle().await;
        info!(
            positions = report.total_positions,
            alerts = report.alert_count,
            total_margin = %report.total_margin,
            "Cycle complete"
        );
    }
}

/// Runs a single cycle and prints the report.
pub async fn run_once(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let monitor = build_monitor(&config)?;

    let report = monitor.run_cycle().await;

    println!("Positions: {}", report.total_positions);
    for (platform, count) in &report.positions_per_platform {
        println!("  {platform}: {count}");
    }
    println!("Total margin: ${}", report.total_margin.round_dp(2));
    println!("Alerts: {}", report.alert_count);
    for path in &report.snapshot_paths {
        println!("Snapshot: {}", path.display());
    }

    Ok(())
}

/// Prints the latest snapshot of the given format.
pub fn show_latest(config_path: &str, format: SnapshotFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let store = SnapshotStore::new(&config.monitor.snapshot_dir);

    let Some(positions) = store.latest(format)? else {
        println!("No snapshot found in {}", config.monitor.snapshot_dir);
        return Ok(());
    };

    for pos in &positions {
        println!(
            "{:<8} {:<14} {:<5} pnl {:>8}%  margin ${:>10}  {} {}",
            pos.platform.to_string(),
            pos.symbol,
            pos.side.to_string(),
            pos.unrealized_pnl_pct.round_dp(2),
            pos.margin_size.round_dp(2),
            pos.trend_status,
            pos.risk_flag,
        );
    }
    println!("({} positions)", positions.len());

    Ok(())
}

/// Applies the retention policy now.
pub fn run_prune(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let store = SnapshotStore::new(&config.monitor.snapshot_dir);

    store.prune(config.monitor.keep_count)?;
    info!(keep_count = config.monitor.keep_count, "Retention applied");

    Ok(())
}
