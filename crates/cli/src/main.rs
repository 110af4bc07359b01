use clap::{Parser, Subcommand};

mod commands;

use perp_sentry_data::SnapshotFormat;

#[derive(Parser)]
#[command(name = "perp-sentry")]
#[command(about = "Leveraged position monitor with threshold alerting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run monitoring cycles on the configured interval
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Sentry.toml")]
        config: String,
    },
    /// Run a single cycle and exit
    Once {
        /// Config file path
        #[arg(short, long, default_value = "config/Sentry.toml")]
        config: String,
    },
    /// Print the latest snapshot
    Latest {
        /// Config file path
        #[arg(short, long, default_value = "config/Sentry.toml")]
        config: String,
        /// Snapshot format to read (csv or json)
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
    /// Apply snapshot retention now
    Prune {
        /// Config file path
        #[arg(short, long, default_value = "config/Sentry.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config } => {
            commands::run_scheduled(&config).await?;
        }
        Commands::Once { config } => {
            commands::run_once(&config).await?;
        }
        Commands::Latest { config, format } => {
            let format = match format.as_str() {
                "json" => SnapshotFormat::Json,
                _ => SnapshotFormat::Csv,
            };
            commands::show_latest(&config, format)?;
        }
        Commands::Prune { config } => {
            commands::run_prune(&config)?;
        }
    }

    Ok(())
}
