//! Fidelity CSV exports: transaction history, realized gain/loss and open
//! positions.

mod actions;
pub mod closed_positions;
pub mod positions;
pub mod transactions;

pub use actions::classify;

use super::ImportError;
use crate::models::AccountId;
use crate::store::AccountRepository;

pub const BROKER: &str = "Fidelity";

/// Date format used by all Fidelity exports.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

fn resolve_account<S: AccountRepository>(
    store: &S,
    account_number: &str,
) -> Result<AccountId, ImportError> {
    store
        .find_account(BROKER, account_number.trim())
        .ok_or_else(|| ImportError::AccountNotFound {
            broker: BROKER.to_string(),
            account_id: account_number.trim().to_string(),
        })
}

fn csv_reader(table: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(table.as_bytes())
}
