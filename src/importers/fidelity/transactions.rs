//! Transaction history export.
//!
//! ```text
//! Run Date,Account,Account Number,Action,Symbol,Description,Type,Quantity,Price ($),Commission ($),Fees ($),Accrued Interest ($),Amount ($),Settlement Date
//! 03/15/2024,"Individual","Z12345678","DIVIDEND RECEIVED APPLE INC (AAPL) (Cash)",AAPL,"APPLE INC",Cash,,,,,,24.00,
//! ```

use super::{classify, csv_reader, resolve_account, DATE_FORMAT};
use crate::core::{ActionType, SecurityRequirement};
use crate::importers::{parse_amount, parse_date, resolve_security, table_section, ImportError};
use crate::models::{AccountId, Security, TickerHistory, Transaction};
use crate::store::{AccountRepository, SecurityRepository, TransactionRepository};
use crate::core::RoundFields;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "Run Date")]
    run_date: String,
    #[serde(rename = "Account Number")]
    account_number: String,
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Quantity")]
    quantity: String,
    #[serde(rename = "Price ($)")]
    price: String,
    #[serde(rename = "Commission ($)")]
    commission: String,
    #[serde(rename = "Fees ($)")]
    fees: String,
    #[serde(rename = "Amount ($)")]
    amount: String,
}

/// Outcome of a transaction history import.
#[derive(Debug, Default)]
pub struct TransactionImport {
    pub transactions: Vec<Transaction>,
    pub new_securities: Vec<Security>,
    pub ticker_history: Vec<TickerHistory>,
    /// `(account, date)` pairs already in the store; their rows were skipped.
    pub skipped: Vec<(AccountId, NaiveDate)>,
}

/// Old ticker of a merger: the first upper case parenthesized token.
fn merger_old_ticker(action: &str) -> Option<String> {
    static TICKER: OnceLock<Regex> = OnceLock::new();
    let re = TICKER.get_or_init(|| Regex::new(r"\(([A-Z][A-Z0-9.]*)\)").expect("valid regex"));
    re.captures(action).map(|c| c[1].to_string())
}

/// Import a transaction history export into `store`.
///
/// Rows for an `(account, date)` pair that already has transactions in the
/// store are skipped as a whole, so importing the same file twice adds
/// nothing the second time.
pub fn import<S>(
    store: &mut S,
    content: &str,
    source_file: &str,
) -> Result<TransactionImport, ImportError>
where
    S: AccountRepository + SecurityRepository + TransactionRepository,
{
    let table = table_section(content, "Run Date")?;
    let mut reader = csv_reader(&table);
    let mut result = TransactionImport::default();
    let mut checked: HashSet<(AccountId, NaiveDate)> = HashSet::new();
    let mut skipped = BTreeSet::new();

    for record in reader.deserialize() {
        let record: Record = record?;
        let date = parse_date(&record.run_date, DATE_FORMAT)?;
        let account = resolve_account(store, &record.account_number)?;

        // Only what was stored before this import counts as already imported.
        let pair = (account, date);
        if skipped.contains(&pair) {
            continue;
        }
        if checked.insert(pair) && store.has_transactions_on(account, date) {
            log::debug!("skipping {} on {}: already imported", record.account_number, date);
            skipped.insert(pair);
            continue;
        }

        let action_type = classify(&record.action)?;
        let transaction_type = action_type.transaction_type();
        let symbol = record.symbol.trim();
        let security = match transaction_type.security_requirement() {
            SecurityRequirement::Forbidden => None,
            SecurityRequirement::Required | SecurityRequirement::Optional
                if !symbol.is_empty() =>
            {
                Some(resolve_security(
                    store,
                    symbol,
                    &record.description,
                    &mut result.new_securities,
                )?)
            }
            SecurityRequirement::Required | SecurityRequirement::Optional => None,
        };

        if action_type == ActionType::MergerNew {
            let old_ticker = merger_old_ticker(&record.action)
                .ok_or_else(|| ImportError::MergerTicker(record.action.clone()))?;
            let history = TickerHistory {
                old_ticker,
                new_ticker: symbol.to_string(),
                date,
            };
            match store.insert_ticker_history(history.clone()) {
                Ok(()) => result.ticker_history.push(history),
                Err(err) if err.is_duplicate() => {
                    log::debug!("ticker history already recorded: {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let transaction = Transaction {
            account,
            date,
            transaction_type,
            action_type,
            description: record.action.trim().to_string(),
            security,
            quantity: parse_amount(&record.quantity)?,
            price: parse_amount(&record.price)?,
            net_amount: parse_amount(&record.amount)?.unwrap_or(Decimal::ZERO),
            commission: parse_amount(&record.commission)?,
            fees: parse_amount(&record.fees)?,
            source_file: source_file.to_string(),
        }
        .rounded();
        store.insert_transaction(transaction.clone())?;
        result.transactions.push(transaction);
    }

    for pair in &skipped {
        log::warn!("skipped account {} on {}: already imported", pair.0, pair.1);
    }
    result.skipped = skipped.into_iter().collect();
    log::info!(
        "imported {} transactions from {}",
        result.transactions.len(),
        source_file
    );
    Ok(result)
}
