//! Realized gain/loss export.
//!
//! Each closed position is a parent row followed by an `ASSOCIATED LOTS`
//! marker and one row per lot. Lot rows leave the account column empty.
//! Only lots are imported; the parent rows are counted to make sure every
//! position was expanded.

use super::{csv_reader, resolve_account, DATE_FORMAT};
use crate::core::RoundFields;
use crate::importers::{
    parse_amount, parse_date, require_amount, resolve_security, table_section, ImportError,
};
use crate::models::{AccountId, ClosedPosition, Security, SecurityId, ValidationError};
use crate::store::{AccountRepository, PositionRepository, SecurityRepository};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

const LOT_MARKER: &str = "ASSOCIATED LOTS";

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "Account Number")]
    account_number: String,
    #[serde(rename = "Symbol(CUSIP)")]
    symbol: String,
    #[serde(rename = "Security Description")]
    description: String,
    #[serde(rename = "Quantity")]
    quantity: String,
    #[serde(rename = "Date Acquired")]
    date_acquired: String,
    #[serde(rename = "Date Sold")]
    date_sold: String,
    #[serde(rename = "Proceeds")]
    proceeds: String,
    #[serde(rename = "Cost Basis")]
    cost_basis: String,
    #[serde(rename = "Short-Term Gain/Loss")]
    short_term: String,
    #[serde(rename = "Long-Term Gain/Loss")]
    long_term: String,
    #[serde(rename = "Wash Sale Loss Disallowed")]
    wash_sale: String,
}

#[derive(Debug, Default)]
pub struct ClosedPositionImport {
    pub positions: Vec<ClosedPosition>,
    pub new_securities: Vec<Security>,
}

/// Lot row values before account specific adjustments.
struct Lot {
    quantity: Decimal,
    date_acquired: NaiveDate,
    date_sold: NaiveDate,
    proceeds: Decimal,
    cost_basis: Decimal,
    short_term: Decimal,
    long_term: Decimal,
    wash_sale: Decimal,
}

impl Lot {
    fn from_record(record: &Record) -> Result<Self, ImportError> {
        // Per-share prices divide by the quantity.
        let quantity = require_amount(&record.quantity, "Quantity")?;
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(quantity).into());
        }
        Ok(Lot {
            quantity,
            date_acquired: parse_date(&record.date_acquired, DATE_FORMAT)?,
            date_sold: parse_date(&record.date_sold, DATE_FORMAT)?,
            proceeds: require_amount(&record.proceeds, "Proceeds")?,
            cost_basis: require_amount(&record.cost_basis, "Cost Basis")?,
            short_term: parse_amount(&record.short_term)?.unwrap_or_default(),
            long_term: parse_amount(&record.long_term)?.unwrap_or_default(),
            wash_sale: parse_amount(&record.wash_sale)?.unwrap_or_default(),
        })
    }

    /// Held for more than one year.
    fn is_long_term(&self) -> bool {
        self.date_acquired
            .checked_add_months(Months::new(12))
            .map_or(false, |anniversary| self.date_sold > anniversary)
    }

    fn into_closed_position(
        self,
        account: AccountId,
        taxable: bool,
        security: SecurityId,
        source_file: &str,
    ) -> ClosedPosition {
        let mut short_term_unadj = self.short_term;
        let mut long_term_unadj = self.long_term;
        // The disallowed loss is added back to the bucket of the holding period.
        let (mut short_term, mut long_term) = if self.is_long_term() {
            (short_term_unadj, long_term_unadj + self.wash_sale)
        } else {
            (short_term_unadj + self.wash_sale, long_term_unadj)
        };
        if !taxable {
            long_term += short_term;
            short_term = Decimal::ZERO;
            long_term_unadj += short_term_unadj;
            short_term_unadj = Decimal::ZERO;
        }
        let cost_basis_total = self.cost_basis - self.wash_sale;
        ClosedPosition {
            account,
            security,
            quantity: self.quantity,
            date_acquired: self.date_acquired,
            date_sold: self.date_sold,
            proceeds_price: self.proceeds / self.quantity,
            proceeds_total: self.proceeds,
            cost_basis_price: cost_basis_total / self.quantity,
            cost_basis_total,
            short_term_pnl: short_term,
            long_term_pnl: long_term,
            proceeds_total_unadj: self.proceeds,
            cost_basis_total_unadj: self.cost_basis,
            short_term_pnl_unadj: short_term_unadj,
            long_term_pnl_unadj: long_term_unadj,
            wash_sale_disallowed: self.wash_sale,
            source_file: source_file.to_string(),
        }
        .rounded()
    }
}

struct Parent {
    account: AccountId,
    taxable: bool,
    symbol: String,
    description: String,
}

pub fn import<S>(
    store: &mut S,
    content: &str,
    source_file: &str,
) -> Result<ClosedPositionImport, ImportError>
where
    S: AccountRepository + SecurityRepository + PositionRepository,
{
    let table = table_section(content, "Account Number")?;
    let mut reader = csv_reader(&table);
    let headers = reader.headers()?.clone();

    let mut result = ClosedPositionImport::default();
    let mut parents = 0;
    let mut groups = 0;
    let mut current: Option<Parent> = None;
    let mut in_group = false;

    for row in reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line() as usize);
        if row.iter().any(|cell| cell.trim() == LOT_MARKER) {
            groups += 1;
            in_group = true;
            continue;
        }
        let record: Record = row.deserialize(Some(&headers))?;

        if !record.account_number.is_empty() {
            parents += 1;
            in_group = false;
            let account = resolve_account(store, &record.account_number)?;
            let taxable = store.account(account).map_or(true, |a| a.taxable);
            current = Some(Parent {
                account,
                taxable,
                symbol: record.symbol.clone(),
                description: record.description.clone(),
            });
            continue;
        }

        let parent = match (&current, in_group) {
            (Some(parent), true) => parent,
            _ => return Err(ImportError::OrphanLot(line)),
        };
        let (symbol, description) = if record.symbol.is_empty() {
            (parent.symbol.as_str(), parent.description.as_str())
        } else {
            (record.symbol.as_str(), record.description.as_str())
        };
        let lot = Lot::from_record(&record)?;
        let security = resolve_security(store, symbol, description, &mut result.new_securities)?;
        let position =
            lot.into_closed_position(parent.account, parent.taxable, security, source_file);
        log::debug!(
            "lot {} {} acquired {} sold {}",
            symbol,
            position.quantity,
            position.date_acquired,
            position.date_sold
        );
        result.positions.push(position);
    }

    if groups != parents {
        return Err(ImportError::LotGroupMismatch { groups, parents });
    }
    for position in &result.positions {
        store.insert_closed_position(position.clone())?;
    }
    log::info!(
        "imported {} closed lots from {} positions in {}",
        result.positions.len(),
        parents,
        source_file
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvestmentAccount;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    const HEADER: &str = "Account Number,Symbol(CUSIP),Security Description,Quantity,Date Acquired,Date Sold,Proceeds,Cost Basis,Short-Term Gain/Loss,Long-Term Gain/Loss,Wash Sale Loss Disallowed\n";

    fn store(taxable: bool) -> MemoryStore {
        let mut store = MemoryStore::default();
        store
            .insert_account(InvestmentAccount {
                broker: "Fidelity".to_string(),
                account_id: "X98765432".to_string(),
                account_name: "Roth IRA".to_string(),
                taxable,
                create_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            })
            .unwrap();
        store
    }

    fn content(rows: &[&str]) -> String {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        content
    }

    #[test]
    fn non_taxable_short_term_moves_to_long_term() {
        let content = content(&[
            "X98765432,VTI,VANGUARD TOTAL STOCK MARKET ETF,2,VARIOUS,05/01/2024,$480.00,$450.00,$30.00,,",
            ",ASSOCIATED LOTS,,,,,,,,,",
            ",VTI,VANGUARD TOTAL STOCK MARKET ETF,2,01/02/2024,05/01/2024,$480.00,$450.00,$30.00,,",
        ]);
        let mut store = store(false);
        let result = import(&mut store, &content, "gains.csv").unwrap();
        let lot = &result.positions[0];
        assert_eq!(lot.short_term_pnl, dec!(0));
        assert_eq!(lot.short_term_pnl_unadj, dec!(0));
        assert_eq!(lot.long_term_pnl, dec!(30.00));
        assert_eq!(lot.long_term_pnl_unadj, dec!(30.00));
        assert_eq!(lot.proceeds_price, dec!(240.0000));
    }

    #[test]
    fn parent_without_lots_is_a_format_error() {
        let content = content(&[
            "X98765432,VTI,VANGUARD TOTAL STOCK MARKET ETF,2,VARIOUS,05/01/2024,$480.00,$450.00,$30.00,,",
            ",ASSOCIATED LOTS,,,,,,,,,",
            ",VTI,VANGUARD TOTAL STOCK MARKET ETF,2,01/02/2024,05/01/2024,$480.00,$450.00,$30.00,,",
            "X98765432,BND,VANGUARD TOTAL BOND MARKET ETF,1,03/01/2020,05/01/2024,$72.00,$85.00,,-$13.00,",
        ]);
        let mut store = store(true);
        assert!(matches!(
            import(&mut store, &content, "gains.csv"),
            Err(ImportError::LotGroupMismatch {
                groups: 1,
                parents: 2
            })
        ));
        assert!(store.closed_positions().is_empty());
    }

    #[test]
    fn zero_quantity_lot_is_rejected() {
        let content = content(&[
            "X98765432,VTI,VANGUARD TOTAL STOCK MARKET ETF,0,VARIOUS,05/01/2024,$480.00,$450.00,$30.00,,",
            ",ASSOCIATED LOTS,,,,,,,,,",
            ",VTI,VANGUARD TOTAL STOCK MARKET ETF,0,01/02/2024,05/01/2024,$480.00,$450.00,$30.00,,",
        ]);
        let mut store = store(true);
        assert!(matches!(
            import(&mut store, &content, "gains.csv"),
            Err(ImportError::Validation(ValidationError::NonPositiveQuantity(q))) if q.is_zero()
        ));
        assert!(store.closed_positions().is_empty());
        assert!(store.securities().is_empty());
    }

    #[test]
    fn lot_without_marker_is_orphaned() {
        let content = content(&[
            "X98765432,VTI,VANGUARD TOTAL STOCK MARKET ETF,2,VARIOUS,05/01/2024,$480.00,$450.00,$30.00,,",
            ",VTI,VANGUARD TOTAL STOCK MARKET ETF,2,01/02/2024,05/01/2024,$480.00,$450.00,$30.00,,",
        ]);
        let mut store = store(true);
        assert!(matches!(
            import(&mut store, &content, "gains.csv"),
            Err(ImportError::OrphanLot(_))
        ));
    }

    #[test]
    fn holding_period_boundary() {
        let lot = |acquired: (i32, u32, u32), sold: (i32, u32, u32)| Lot {
            quantity: dec!(1),
            date_acquired: NaiveDate::from_ymd_opt(acquired.0, acquired.1, acquired.2).unwrap(),
            date_sold: NaiveDate::from_ymd_opt(sold.0, sold.1, sold.2).unwrap(),
            proceeds: dec!(1),
            cost_basis: dec!(1),
            short_term: dec!(0),
            long_term: dec!(0),
            wash_sale: dec!(0),
        };
        assert!(!lot((2023, 3, 1), (2024, 3, 1)).is_long_term());
        assert!(lot((2023, 3, 1), (2024, 3, 2)).is_long_term());
    }
}
