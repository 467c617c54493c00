//! Open positions export. The file carries no date of its own; the caller
//! supplies the statement date.

use super::{csv_reader, resolve_account};
use crate::core::RoundFields;
use crate::importers::{
    parse_amount, require_amount, resolve_security, table_section, ImportError,
};
use crate::models::{Position, Security};
use crate::store::{AccountRepository, PositionRepository, SecurityRepository};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "Account Number")]
    account_number: String,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Quantity")]
    quantity: String,
    #[serde(rename = "Last Price")]
    last_price: String,
    #[serde(rename = "Current Value")]
    current_value: String,
    #[serde(rename = "Cost Basis Total")]
    cost_basis_total: String,
}

#[derive(Debug, Default)]
pub struct PositionImport {
    pub positions: Vec<Position>,
    pub new_securities: Vec<Security>,
}

pub fn import<S>(
    store: &mut S,
    content: &str,
    as_of_date: NaiveDate,
) -> Result<PositionImport, ImportError>
where
    S: AccountRepository + SecurityRepository + PositionRepository,
{
    let table = table_section(content, "Account Number")?;
    let mut reader = csv_reader(&table);
    let mut result = PositionImport::default();

    for record in reader.deserialize() {
        let record: Record = record?;
        // Money market funds are listed as `SPAXX**`.
        let symbol = record.symbol.trim_end_matches("**");
        if symbol.is_empty() {
            log::debug!("skipping row without symbol: {}", record.description);
            continue;
        }
        let account = resolve_account(store, &record.account_number)?;
        let security =
            resolve_security(store, symbol, &record.description, &mut result.new_securities)?;
        let quantity = require_amount(&record.quantity, "Quantity")?;
        let market_value = require_amount(&record.current_value, "Current Value")?;
        // Cash positions have no last price; their value is the quantity.
        let price = parse_amount(&record.last_price)?.unwrap_or(Decimal::ONE);
        let position = Position {
            account,
            security,
            as_of_date,
            quantity,
            price,
            market_value,
            cost_basis_total: parse_amount(&record.cost_basis_total)?,
        }
        .rounded();
        store.insert_position(position.clone())?;
        result.positions.push(position);
    }

    log::info!(
        "imported {} positions as of {}",
        result.positions.len(),
        as_of_date
    );
    Ok(result)
}
