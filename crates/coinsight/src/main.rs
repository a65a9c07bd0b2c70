use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coinsight::models::{AgentInput, CoinsightConfig, DebateConfig};
use coinsight::Coinsight;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coinsight", about = "Crypto token scoring and multi-agent consensus")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/coinsight.toml")]
    config: String,

    /// Pretty-print the output JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a token symbol or contract address
    Analyze { token: String },
    /// Run a multi-agent debate for a token
    Debate {
        token: String,
        /// Rounds, 1 to 5 (defaults to the config value)
        #[arg(long)]
        rounds: Option<u32>,
        /// Quorum, 0.5 to 1.0 (defaults to the config value)
        #[arg(long)]
        quorum: Option<f64>,
    },
    /// Write today's signals for the top tokens by market cap
    BacktestDay {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Summarize BUY basket performance over recent days
    Summary {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Evaluate configured alert rules against the latest signals
    Alerts,
    /// Run the daily backtest on schedule until interrupted
    Daemon,
}

fn load(path: &str) -> Result<CoinsightConfig> {
    if std::path::Path::new(path).exists() {
        coinsight::load_config(path)
    } else {
        tracing::warn!(path, "Config file not found, using defaults");
        let mut config = CoinsightConfig::default();
        config.providers.apply_env();
        Ok(config)
    }
}

fn print<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load(&cli.config)?;
    let app = Coinsight::build(&config).context("Failed to build coinsight")?;

    match cli.command {
        Command::Analyze { token } => {
            let analysis = app.analyze(&token).await;
            print(&analysis, cli.pretty)?;
        }
        Command::Debate {
            token,
            rounds,
            quorum,
        } => {
            let defaults = config.debate.config();
            let debate = DebateConfig {
                rounds: rounds.unwrap_or(defaults.rounds),
                quorum: quorum.unwrap_or(defaults.quorum),
            };
            let decision = app
                .debate(&AgentInput::new(token), &debate)
                .await
                .context("Debate failed")?;
            print(&decision, cli.pretty)?;
        }
        Command::BacktestDay { limit } => {
            let limit = limit.unwrap_or(config.backtest.universe_limit);
            let count = app
                .run_backtest_day(limit)
                .await
                .context("Backtest day failed")?;
            print(&serde_json::json!({ "count": count }), cli.pretty)?;
        }
        Command::Summary { days } => {
            let days = days.unwrap_or(config.backtest.summary_days);
            let summary = app
                .backtest_summary(days)
                .context("Backtest summary failed")?;
            print(&summary, cli.pretty)?;
        }
        Command::Alerts => {
            let events = app.alerts().context("Alert evaluation failed")?;
            print(&events, cli.pretty)?;
        }
        Command::Daemon => {
            let daemon = app.daemon().context("Failed to build daemon")?;
            let cancel = daemon.cancel_token();

            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Received shutdown signal");
                cancel.cancel();
            });

            daemon
                .run()
                .await
                .map_err(|e| anyhow::anyhow!("Daemon error: {e}"))?;
        }
    }

    Ok(())
}
