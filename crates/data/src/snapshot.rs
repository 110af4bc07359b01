//! Timestamped position snapshots with per-format retention.
//!
//! Every cycle writes one CSV and one JSON file named
//! `positions_YYYYMMDD_HHMM.{csv,json}` (UTC, minute granularity). Writes go
//! to a temporary name in the same directory and are renamed on completion,
//! so a reader that opens the latest file by mtime never observes a partial
//! write. `save` never overwrites: a second save within the same minute gets
//! a numeric suffix. Retention keeps the N most recently modified files of
//! each format; selection is always by OS mtime, not by parsing the embedded
//! timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

use perp_sentry_core::position::{Platform, Position, RiskFlag, Side, TpSlStatus};
use perp_sentry_core::risk;

/// Filename prefix shared by all snapshot files.
pub const SNAPSHOT_PREFIX: &str = "positions_";

/// Serialization format of a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Csv,
    Json,
}

impl SnapshotFormat {
    /// All formats a cycle persists.
    pub const ALL: [Self; 2] = [Self::Csv, Self::Json];

    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Errors from snapshot persistence operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error reading/writing a snapshot file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization/deserialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Snapshot record
// =============================================================================

/// One persisted row; the same logical columns for CSV and JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(rename = "Platform")]
    pub platform: Platform,

    #[serde(rename = "Symbol")]
    pub symbol: String,

    #[serde(rename = "Side")]
    pub side: Side,

    #[serde(rename = "Entry Price")]
    pub entry_price: Decimal,

    #[serde(rename = "Mark Price")]
    pub mark_price: Decimal,

    #[serde(rename = "Leverage")]
    pub leverage: Decimal,

    #[serde(rename = "Amount")]
    pub amount: Decimal,

    #[serde(rename = "Margin Size ($)")]
    pub margin_size: Decimal,

    #[serde(rename = "PnL %")]
    pub pnl_pct: Decimal,

    #[serde(rename = "Unrealized PnL %")]
    pub unrealized_pnl_pct: Decimal,

    #[serde(rename = "Unrealized PnL $")]
    pub unrealized_pnl_abs: Decimal,

    #[serde(rename = "SL (Stop Loss)")]
    pub sl_price: Decimal,

    #[serde(rename = "TP (Take Profit)")]
    pub tp_price: Decimal,

    #[serde(rename = "Distance to TP (%)")]
    pub distance_to_tp_pct: Decimal,

    #[serde(rename = "Distance to SL (%)")]
    pub distance_to_sl_pct: Decimal,

    #[serde(rename = "TP Set?")]
    pub tp_set: bool,

    #[serde(rename = "SL Set?")]
    pub sl_set: bool,

    #[serde(rename = "Margin % of Portfolio")]
    pub margin_pct_of_portfolio: Decimal,

    #[serde(rename = "TP/SL Status")]
    pub tp_sl_status: TpSlStatus,

    #[serde(rename = "Risk Flag")]
    pub risk_flag: RiskFlag,

    #[serde(rename = "Entry Timestamp")]
    pub entry_timestamp: Option<DateTime<Utc>>,
}

impl SnapshotRecord {
    #[must_use]
    pub fn from_position(position: &Position) -> Self {
        Self {
            platform: position.platform,
            symbol: position.symbol.clone(),
            side: position.side,
            entry_price: position.entry_price,
            mark_price: position.mark_price,
            leverage: position.leverage,
            amount: position.amount,
            margin_size: position.margin_size,
            // margin-relative PnL% and leverage-adjusted PnL% coincide
            // because unrealized_pnl_abs = pnl_pct/100 * margin_size
            pnl_pct: position.unrealized_pnl_pct,
            unrealized_pnl_pct: position.unrealized_pnl_pct,
            unrealized_pnl_abs: position.unrealized_pnl_abs,
            sl_price: position.sl_price,
            tp_price: position.tp_price,
            distance_to_tp_pct: position.distance_to_tp_pct,
            distance_to_sl_pct: position.distance_to_sl_pct,
            tp_set: position.tp_set(),
            sl_set: position.sl_set(),
            margin_pct_of_portfolio: position.margin_pct_of_portfolio,
            tp_sl_status: position.tp_sl_status(),
            risk_flag: position.risk_flag,
            entry_timestamp: position.created_at,
        }
    }

    /// Rebuilds a position from a persisted row. Fields that are not
    /// declared columns (notional, rsi proxy, trend, risk/reward) are
    /// re-derived from the persisted ones.
    #[must_use]
    pub fn into_position(self) -> Position {
        let mut position = Position::new(self.platform, self.symbol, self.side);
        position.entry_price = self.entry_price;
        position.mark_price = self.mark_price;
        position.leverage = self.leverage;
        position.notional = self.margin_size * self.leverage;
        position.amount = self.amount;
        position.sl_price = self.sl_price;
        position.tp_price = self.tp_price;
        position.created_at = self.entry_timestamp;
        position.margin_size = self.margin_size;
        position.unrealized_pnl_pct = self.unrealized_pnl_pct;
        position.unrealized_pnl_abs = self.unrealized_pnl_abs;
        position.distance_to_tp_pct = self.distance_to_tp_pct;
        position.distance_to_sl_pct = self.distance_to_sl_pct;
        position.margin_pct_of_portfolio = self.margin_pct_of_portfolio;
        position.rsi_proxy = risk::rsi_proxy(self.unrealized_pnl_pct);
        position.trend_status = risk::classify_trend(self.unrealized_pnl_pct);
        position.risk_flag = self.risk_flag;
        position.risk_reward = risk::risk_reward(self.mark_price, self.sl_price, self.tp_price);
        position
    }
}

// =============================================================================
// Store
// =============================================================================

/// Writes, loads, and prunes snapshot files in one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists the position set as a new timestamped file and returns its
    /// path. Never overwrites an existing snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(
        &self,
        positions: &[Position],
        format: SnapshotFormat,
    ) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.next_path(format);
        let tmp_name = format!(
            ".{}.tmp",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("snapshot")
        );
        let tmp_path = self.dir.join(tmp_name);

        let records: Vec<SnapshotRecord> =
            positions.iter().map(SnapshotRecord::from_position).collect();

        match format {
            SnapshotFormat::Csv => {
                let file = File::create(&tmp_path)?;
                let mut writer = csv::Writer::from_writer(BufWriter::new(file));
                for record in &records {
                    writer.serialize(record)?;
                }
                writer.flush()?;
            }
            SnapshotFormat::Json => {
                let file = File::create(&tmp_path)?;
                let writer = BufWriter::new(file);
                serde_json::to_writer_pretty(writer, &records)?;
            }
        }

        // Rename-on-completion keeps mtime-based readers away from partial
        // writes.
        fs::rename(&tmp_path, &path)?;

        debug!(
            path = %path.display(),
            count = records.len(),
            "Saved snapshot"
        );

        Ok(path)
    }

    /// Loads the most recently modified snapshot of the given format, or
    /// `None` if no snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or the newest
    /// file cannot be parsed.
    pub fn latest(
        &self,
        format: SnapshotFormat,
    ) -> Result<Option<Vec<Position>>, SnapshotError> {
        let Some((path, _)) = self
            .list(format)?
            .into_iter()
            .max_by_key(|(_, mtime)| *mtime)
        else {
            return Ok(None);
        };

        let records: Vec<SnapshotRecord> = match format {
            SnapshotFormat::Csv => {
                let file = File::open(&path)?;
                let mut reader = csv::Reader::from_reader(BufReader::new(file));
                reader.deserialize().collect::<Result<_, _>>()?
            }
            SnapshotFormat::Json => {
                let file = File::open(&path)?;
                serde_json::from_reader(BufReader::new(file))?
            }
        };

        debug!(path = %path.display(), count = records.len(), "Loaded latest snapshot");

        Ok(Some(
            records.into_iter().map(SnapshotRecord::into_position).collect(),
        ))
    }

    /// Deletes all but the `keep_count` most recently modified files of each
    /// format. A file that cannot be deleted is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot directory cannot be listed.
    pub fn prune(&self, keep_count: usize) -> Result<(), SnapshotError> {
        for format in SnapshotFormat::ALL {
            let mut files = self.list(format)?;
            if files.len() <= keep_count {
                continue;
            }

            // newest first; everything past keep_count goes
            files.sort_by_key(|(_, mtime)| std::cmp::Reverse(*mtime));
            for (path, _) in files.drain(keep_count..) {
                match fs::remove_file(&path) {
                    Ok(()) => info!(path = %path.display(), "Deleted old snapshot"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to delete snapshot")
                    }
                }
            }
        }
        Ok(())
    }

    /// Lists snapshot files of one format with their modification times.
    fn list(
        &self,
        format: SnapshotFormat,
    ) -> Result<Vec<(PathBuf, SystemTime)>, SnapshotError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(SNAPSHOT_PREFIX) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(format.extension()) {
                continue;
            }

            let mtime = entry.metadata()?.modified()?;
            files.push((path, mtime));
        }
        Ok(files)
    }

    /// Next collision-free path for a snapshot written now.
    fn next_path(&self, format: SnapshotFormat) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M");
        let base = self
            .dir
            .join(format!("{SNAPSHOT_PREFIX}{stamp}.{}", format.extension()));
        if !base.exists() {
            return base;
        }

        let mut n = 2;
        loop {
            let candidate = self
                .dir
                .join(format!("{SNAPSHOT_PREFIX}{stamp}_{n}.{}", format.extension()));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
