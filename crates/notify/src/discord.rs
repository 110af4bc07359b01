//! Discord webhook sink.
//!
//! Renders the batch as one plain-text message (summary first, then the
//! individual alert lines) and posts it to a webhook URL. Discord caps
//! message content at 2000 characters; the rendering truncates below that.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

use perp_sentry_core::alert::AlertBatch;
use perp_sentry_core::traits::AlertSink;

/// Discord message content limit, with headroom for the truncation marker.
const MAX_CONTENT_LEN: usize = 1900;

pub struct DiscordWebhookSink {
    http: reqwest::Client,
    webhook_url: String,
}

impl DiscordWebhookSink {
    #[must_use]
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    /// Renders the batch into one webhook message body.
    #[must_use]
    pub fn render_content(batch: &AlertBatch) -> String {
        let mut content = format!("Trading alerts ({})\n", batch.total_alerts);

        for line in &batch.summary_lines {
            content.push_str(line);
            content.push('\n');
        }

        for alert in &batch.alerts {
            let line = format!("- [{}] {}\n", alert.platform, alert.message);
            if content.len() + line.len() > MAX_CONTENT_LEN {
                content.push_str("...");
                break;
            }
            content.push_str(&line);
        }

        content
    }
}

#[async_trait]
impl AlertSink for DiscordWebhookSink {
    fn name(&self) -> &str {
        "discord-webhook"
    }

    async fn deliver(&self, batch: &AlertBatch) -> Result<()> {
        let content = Self::render_content(batch);
        let payload = serde_json::json!({ "content": content });

        let response = self.http.post(&self.webhook_url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Discord webhook returned {status}: {body}");
        }

        debug!(count = batch.total_alerts, "Delivered alert batch to Discord");
        Ok(())
    }
}
