//! Wells Fargo mortgage statement PDF. A statement covers the calendar
//! month before the payment due date.

use super::pdf::{find_address, read_pdf_text, TextTable};
use super::{store_bill, ImportError};
use crate::core::{Provider, RoundFields};
use crate::models::{BillBase, BillId, MortgageBillData, TaxRelatedCost, YearMonth};
use crate::store::{BillRepository, RealEstateRepository};
use rust_decimal::Decimal;
use std::path::Path;

pub fn parse_text(text: &str, source_file: &str) -> Result<MortgageBillData, ImportError> {
    let table = TextTable::parse(text);
    let real_estate = find_address(text, source_file)?;
    let due_date = table.date("Payment due date", 0)?;
    let period = YearMonth::of(due_date).prev();

    let bill = MortgageBillData {
        base: BillBase {
            real_estate,
            service_provider: Provider::WellsFargo,
            start_date: period.first_day(),
            end_date: period.last_day(),
            total_cost: table.amount("Total amount due", 0)?,
            tax_related_cost: Decimal::ZERO,
            paid_date: None,
            notes: None,
            source_file: source_file.to_string(),
        },
        principal_payment: table.amount("Principal", 0)?,
        interest_payment: table.amount("Interest", 0)?,
        escrow_payment: table.amount("Escrow (for taxes and insurance)", 0)?,
        fees: table.optional_amount("Fees", 0)?.unwrap_or_default(),
        outstanding_principal: table.amount("Outstanding principal", 0)?,
        interest_rate: table.percent("Interest rate", 0)?,
    };
    log::debug!("{}: payment due {}", source_file, due_date);
    Ok(bill.rounded())
}

pub fn import<S>(
    store: &mut S,
    path: &Path,
    tax_related_cost: TaxRelatedCost,
) -> Result<BillId, ImportError>
where
    S: RealEstateRepository + BillRepository,
{
    let text = read_pdf_text(path)?;
    let bill = parse_text(&text, &super::source_name(path))?;
    let (id, _) = store_bill(store, bill, tax_related_cost)?;
    Ok(id)
}
