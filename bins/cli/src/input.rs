//! Loading rate and transaction files.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use tally_core::{ExchangeRate, RateIndex, Transaction};
use tally_shared::{AppError, AppResult};
use tracing::info;

/// Reads a JSON array from `path`.
fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            AppError::NotFound(path.display().to_string())
        } else {
            AppError::Io(format!("{}: {e}", path.display()))
        }
    })?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::Validation(format!("{}: {e}", path.display())))
}

/// Loads a rate file and builds the index from it.
pub fn load_rate_index(path: &Path) -> AppResult<RateIndex> {
    let rates: Vec<ExchangeRate> = read_json(path)?;
    let count = rates.len();
    let index = RateIndex::build(rates)
        .map_err(|e| AppError::Validation(format!("{}: {e}", path.display())))?;
    info!(
        path = %path.display(),
        records = count,
        dates = index.date_count(),
        "Loaded exchange rates"
    );
    Ok(index)
}

/// Loads a transaction file.
pub fn load_transactions(path: &Path) -> AppResult<Vec<Transaction>> {
    let transactions: Vec<Transaction> = read_json(path)?;
    info!(
        path = %path.display(),
        transactions = transactions.len(),
        "Loaded transactions"
    );
    Ok(transactions)
}
