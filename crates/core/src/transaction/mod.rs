//! Bank-statement transactions and their conversion into a display currency.

pub mod batch;
pub mod types;

pub use batch::convert_transactions;
pub use types::{ConversionSummary, ConvertedTransaction, Transaction};
