use crate::alert::AlertBatch;
use crate::position::Platform;
use crate::raw::{RawOrder, RawPosition};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One exchange account the monitor pulls positions from.
///
/// Implementations may fail; the cycle isolates a failing connector by
/// degrading it to an empty result set for that cycle.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    fn platform(&self) -> Platform;
    async fn fetch_positions(&self) -> Result<Vec<RawPosition>>;
    async fn fetch_open_orders(&self) -> Result<Vec<RawOrder>>;
}

/// Delivery target for one cycle's alert batch.
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, batch: &AlertBatch) -> Result<()>;
}

/// Filter handed to the news collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsFilter {
    /// Symbols currently held; providers match articles against these.
    pub symbols: Vec<String>,
    /// Upper bound on returned articles.
    pub max_items: usize,
}

/// An article returned by the news collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub source: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    /// The held symbol this article matched, if any.
    pub matched_symbol: Option<String>,
}

/// News retrieval collaborator; external to this repository, interface only.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(&self, filter: &NewsFilter) -> Result<Vec<Article>>;
}
