use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sentitrader::api::{
    AlpacaClient, BrokerClient, DryRunBroker, HuggingFaceClient, TwitterClient,
};
use sentitrader::config::AppConfig;
use sentitrader::execution::{TradeOutcome, Trader};
use sentitrader::nlp::BasicCleaner;
use sentitrader::pipeline::{SignalPipeline, SymbolTarget};
use tracing_subscriber::EnvFilter;

/// Read recent posts about each symbol, score their sentiment and place a
/// price-gated limit order when the signal says so.
#[derive(Debug, Parser)]
#[command(name = "sentitrader", version)]
struct Cli {
    /// Settings file (defaults to ./Settings.{toml,yaml,json} if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only run these symbols (repeatable)
    #[arg(short, long = "symbol")]
    symbols: Vec<String>,

    /// Log orders instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let targets = select_targets(&config.symbols, &cli.symbols);
    if targets.is_empty() {
        anyhow::bail!("No symbols to trade; add [[symbols]] to the settings file");
    }

    let dry_run = cli.dry_run || config.trade.dry_run;
    let pipeline = build_pipeline(&config, dry_run)?;

    tracing::info!("🚀 sentitrader starting");
    tracing::info!("  Symbols: {}", targets.len());
    tracing::info!("  Model: {}", config.huggingface.model);
    tracing::info!(
        "  Threshold: {}% over last {} {:?} bars",
        config.trade.threshold_pct,
        config.trade.lookback_count,
        config.trade.lookback_unit
    );
    if dry_run {
        tracing::info!("  Dry run: orders will only be logged");
    }

    let results = pipeline.run_all(&targets).await;

    let mut failures = 0;
    for (symbol, result) in &results {
        match result {
            Ok(report) => {
                let summary = match &report.outcome {
                    TradeOutcome::Submitted(order) => {
                        format!("{} {} @ {}", order.side, order.qty, order.limit_price)
                    }
                    TradeOutcome::Held => "hold".to_string(),
                    TradeOutcome::Abstained { .. } => "abstained (price outside band)".to_string(),
                    TradeOutcome::NoData => "no data (market closed)".to_string(),
                };
                tracing::info!(
                    "{}: {} posts, sentiment {:.3} -> {} -> {}",
                    symbol,
                    report.texts_analyzed,
                    report.aggregate.avg_sentiment,
                    report.aggregate.signal,
                    summary
                );
            }
            Err(_) => failures += 1,
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} symbols failed", failures, results.len());
    }

    tracing::info!("👋 sentitrader done");
    Ok(())
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentitrader=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn select_targets(configured: &[SymbolTarget], only: &[String]) -> Vec<SymbolTarget> {
    configured
        .iter()
        .filter(|t| only.is_empty() || only.iter().any(|s| s.eq_ignore_ascii_case(&t.symbol)))
        .cloned()
        .collect()
}

fn build_pipeline(config: &AppConfig, dry_run: bool) -> anyhow::Result<SignalPipeline> {
    let twitter = TwitterClient::with_base_url(
        config.twitter.bearer_token.clone(),
        config.twitter.base_url.clone(),
    );

    let classifier = HuggingFaceClient::with_base_url(
        config.huggingface.token.clone(),
        config.huggingface.model.clone(),
        config.huggingface.labels(),
        config.huggingface.base_url.clone(),
    )
    .context("Failed to create sentiment classifier")?;

    let cleaner = BasicCleaner::new().context("Failed to build text cleaner")?;

    let alpaca = Arc::new(
        AlpacaClient::new(
            config.alpaca.api_key.clone(),
            config.alpaca.secret_key.clone(),
        )
        .with_endpoints(
            config.alpaca.trading_base_url.clone(),
            config.alpaca.data_base_url.clone(),
        )
        .with_stock_feed(config.alpaca.stock_feed.clone()),
    );

    let broker: Arc<dyn BrokerClient> = if dry_run {
        Arc::new(DryRunBroker)
    } else {
        alpaca.clone()
    };

    let pipeline = SignalPipeline::new(
        Arc::new(twitter),
        Arc::new(cleaner),
        Arc::new(classifier),
        Trader::new(alpaca, broker),
        config.trade_settings(),
    )
    .context("Invalid signal configuration")?;

    Ok(pipeline)
}
