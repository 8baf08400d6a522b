//! Tally command-line front end.
//!
//! Converts a transaction file into a display currency using a file of
//! USD-quoted daily rates.

mod input;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tally_core::currency::ConversionError;
use tally_core::{CurrencyConverter, convert_transactions};
use tally_shared::{AppConfig, AppError, CurrencyCode, LoggingConfig};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tally", version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file layered over the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert transactions into a display currency
    Convert {
        /// JSON array of exchange rates
        #[arg(long)]
        rates: PathBuf,

        /// JSON array of transactions
        #[arg(long)]
        transactions: PathBuf,

        /// Display currency (defaults to the configured base currency)
        #[arg(long)]
        display: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a rate file
    Inspect {
        /// JSON array of exchange rates
        #[arg(long)]
        rates: PathBuf,
    },
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tally=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
    };

    let (json, plain) = if config.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match AppConfig::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            return report_app_error(&AppError::from(e));
        }
    };

    init_logging(&config.logging, cli.verbose);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            match e.downcast_ref::<AppError>() {
                Some(err) => report_app_error(err),
                None => {
                    eprintln!("tally: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Prints `err` with its stable code and maps it to an exit status.
fn report_app_error(err: &AppError) -> ExitCode {
    eprintln!("tally: {}: {err}", err.error_code());
    ExitCode::from(err.exit_code())
}

fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Convert {
            rates,
            transactions,
            display,
            json,
        } => convert(config, &rates, &transactions, display.as_deref(), json),
        Commands::Inspect { rates } => {
            let index = input::load_rate_index(&rates)?;
            print!("{}", report::render_index(&index));
            Ok(())
        }
    }
}

fn convert(
    config: &AppConfig,
    rates: &Path,
    transactions: &Path,
    display_code: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let display_currency = match display_code {
        Some(code) => {
            CurrencyCode::new(code).map_err(|e| AppError::Validation(e.to_string()))?
        }
        None => config.conversion.base_currency.clone(),
    };

    let index = input::load_rate_index(rates)?;
    let transactions = input::load_transactions(transactions)?;

    let converter = CurrencyConverter::from_config(&config.conversion);
    debug!(
        base = %converter.base_currency(),
        %display_currency,
        "Converting transactions"
    );

    let summary = convert_transactions(&converter, &transactions, &display_currency, &index)
        .map_err(|e| match e {
            ConversionError::BaseCurrencyMismatch { .. } => AppError::Validation(e.to_string()),
            ConversionError::Overflow { .. } => AppError::Internal(e.to_string()),
        })?;

    info!(
        rows = summary.rows.len(),
        degraded = summary.degraded_count,
        fallback = summary.fallback_count,
        "Conversion complete"
    );

    if json {
        let out = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize conversion summary")?;
        println!("{out}");
    } else {
        print!(
            "{}",
            report::render_summary(&summary, config.conversion.display_decimal_places)
        );
    }
    Ok(())
}
