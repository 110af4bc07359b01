//! Snapshot storage for the perp position monitor.
//!
//! This crate provides:
//! - Timestamped CSV/JSON exports of the enriched position set
//! - Latest-snapshot selection by file modification time
//! - Per-format retention of the N most recent files

pub mod snapshot;

pub use snapshot::{SnapshotError, SnapshotFormat, SnapshotRecord, SnapshotStore, SNAPSHOT_PREFIX};
