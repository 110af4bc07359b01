use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub bingx: ExchangeCredentials,
    pub blofin: ExchangeCredentials,
    pub kraken: ExchangeCredentials,
    pub alerts: AlertDeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between cycles when running under the scheduler.
    pub interval_secs: u64,
    /// Directory snapshots are written to.
    pub snapshot_dir: String,
    /// Snapshot files retained per format.
    pub keep_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeCredentials {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Required by Blofin only.
    #[serde(default)]
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDeliveryConfig {
    /// Discord webhook URL; delivery is skipped when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// JSON file the alert batch is written to for bot consumption.
    #[serde(default)]
    pub alerts_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig {
                interval_secs: 3600,
                snapshot_dir: "snapshots".to_string(),
                keep_count: 3,
            },
            bingx: ExchangeCredentials {
                enabled: false,
                base_url: "https://open-api.bingx.com".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
                passphrase: None,
            },
            blofin: ExchangeCredentials {
                enabled: false,
                base_url: "https://openapi.blofin.com".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
                passphrase: None,
            },
            kraken: ExchangeCredentials {
                enabled: false,
                base_url: "https://futures.kraken.com".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
                passphrase: None,
            },
            alerts: AlertDeliveryConfig {
                webhook_url: None,
                alerts_file: Some("latest_alerts.json".to_string()),
            },
        }
    }
}
