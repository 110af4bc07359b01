//! File sink: writes the latest alert batch as JSON for bot consumption.
//!
//! Each delivery replaces the previous file contents; downstream bots read
//! the file on their own schedule. The write goes to a temporary name and
//! is renamed on completion so readers never observe a partial batch.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::debug;

use perp_sentry_core::alert::AlertBatch;
use perp_sentry_core::traits::AlertSink;

pub struct FileAlertSink {
    path: PathBuf,
}

impl FileAlertSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl AlertSink for FileAlertSink {
    fn name(&self) -> &str {
        "alerts-file"
    }

    async fn deliver(&self, batch: &AlertBatch) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let file = File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), batch)?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("renaming into {}", self.path.display()))?;

        debug!(
            path = %self.path.display(),
            count = batch.total_alerts,
            "Wrote alert batch"
        );
        Ok(())
    }
}
