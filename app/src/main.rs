// In app/src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::{DecisionRecord, Ticker};
use engine::DecisionOrchestrator;
use indicators::IndicatorEngine;
use ledger::Ledger;
use market_data::YahooClient;
use tracing_subscriber::prelude::*;

mod transport_factory;
use crate::transport_factory::create_transport;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Asks an advisory oracle what to do next with a ticker and keeps a ledger of the answers.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyses tickers one after another and records a decision for each.
    Run {
        /// Ticker to analyse (e.g., "PETR4.SA"). Repeatable; defaults to the configured list.
        #[arg(short, long)]
        ticker: Vec<String>,
    },

    /// Prints the last recorded decision for a ticker.
    LastAction {
        #[arg(short, long)]
        ticker: String,
    },

    /// Prints the most recent decision records for a ticker.
    History {
        #[arg(short, long)]
        ticker: String,

        /// How many records to show.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Renders the prompt for a ticker and saves it without asking the oracle.
    Prompt {
        #[arg(short, long)]
        ticker: String,

        /// Where to write the prompt.
        #[arg(short, long, default_value = "prompt.txt")]
        output: PathBuf,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings().context("Failed to load settings")?;
    init_tracing(&settings.app.log_level)?;
    tracing::info!(environment = %settings.app.environment, "Application settings loaded successfully.");

    match cli.command {
        Commands::Run { ticker } => handle_run(&settings, ticker).await?,
        Commands::LastAction { ticker } => handle_last_action(&settings, ticker).await?,
        Commands::History { ticker, limit } => handle_history(&settings, ticker, limit).await?,
        Commands::Prompt { ticker, output } => handle_prompt(&settings, ticker, output).await?,
    }

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level: tracing::Level = log_level
        .parse()
        .with_context(|| format!("Invalid app.log_level {:?}", log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("sqlx", tracing::Level::WARN) // Keep sqlx query logs out of the way
                .with_default(level),
        );
    tracing_subscriber::registry().with(fmt_layer).init();
    Ok(())
}

async fn open_ledger(settings: &Settings) -> Result<Arc<dyn Ledger>> {
    let ledger = ledger::connect(&settings.database).await?;
    tracing::info!(url = %settings.database.url, "Ledger opened and migrations are up-to-date.");
    Ok(Arc::new(ledger))
}

/// Wires every collaborator from the settings.
async fn build_orchestrator(settings: &Settings) -> Result<DecisionOrchestrator> {
    let market_data = YahooClient::new(&settings.market_data)?;
    let indicators = IndicatorEngine::new(settings.indicators.clone())?;
    let ledger = open_ledger(settings).await?;
    let oracle = create_transport(&settings.oracle)?;

    Ok(DecisionOrchestrator::new(Box::new(market_data), indicators, ledger, oracle))
}

fn print_record(record: &DecisionRecord) {
    println!("{}", record.row().join("\t"));
}

// --- Subcommand Handlers ---

async fn handle_run(settings: &Settings, tickers: Vec<String>) -> Result<()> {
    let tickers: Vec<Ticker> = if tickers.is_empty() {
        settings.app.tickers.iter().cloned().map(Ticker::from).collect()
    } else {
        tickers.into_iter().map(Ticker::from).collect()
    };
    if tickers.is_empty() {
        anyhow::bail!("No tickers to analyse. Pass --ticker or set app.tickers.");
    }

    let mut orchestrator = build_orchestrator(settings).await?;

    orchestrator.open_session().await?;
    let results = orchestrator.run_batch(&tickers).await;
    // The session is closed even when every run failed.
    if let Err(e) = orchestrator.close_session().await {
        tracing::warn!(error = %e, "Failed to close the oracle session.");
    }

    let mut failed = 0usize;
    for result in &results {
        match result {
            Ok(record) => print_record(record),
            Err(e) => {
                failed += 1;
                eprintln!("{}", e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} tickers failed.", failed, tickers.len());
    }
    tracing::info!(count = tickers.len(), "All tickers analysed.");
    Ok(())
}

async fn handle_last_action(settings: &Settings, ticker: String) -> Result<()> {
    let ledger = open_ledger(settings).await?;
    let last_action = ledger.last_action(&Ticker::from(ticker)).await?;
    println!("{}", last_action);
    Ok(())
}

async fn handle_history(settings: &Settings, ticker: String, limit: usize) -> Result<()> {
    let ledger = open_ledger(settings).await?;
    let ticker = Ticker::from(ticker);
    let records = ledger.history(&ticker, limit).await?;

    if records.is_empty() {
        tracing::info!(%ticker, "No decisions recorded yet.");
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

async fn handle_prompt(settings: &Settings, ticker: String, output: PathBuf) -> Result<()> {
    let orchestrator = build_orchestrator(settings).await?;
    let prompt = orchestrator.preview_prompt(&Ticker::from(ticker)).await?;

    oracle::file_relay::save_prompt(&output, &prompt).await?;
    println!("Prompt saved to {}", output.display());
    Ok(())
}
