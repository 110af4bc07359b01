pub mod alert;
pub mod config;
pub mod config_loader;
pub mod position;
pub mod raw;
pub mod risk;
pub mod traits;

pub use alert::{Alert, AlertBatch, AlertKind};
pub use config::{AlertDeliveryConfig, AppConfig, ExchangeCredentials, MonitorConfig};
pub use config_loader::ConfigLoader;
pub use position::{Platform, Position, PositionKey, RiskFlag, Side, TpSlStatus, TrendStatus};
pub use raw::{OrderKind, RawOrder, RawPosition};
pub use traits::{AlertSink, Article, ExchangeConnector, NewsFilter, NewsProvider};
