//! PSE&G gas bill PDF. Same layout as the electric bill with therm tiers;
//! the sales tax rate is not always printed.

use super::pdf::{billing_period, find_address, read_pdf_text, TextTable};
use super::{parse_amount, parse_percent, store_bill, ImportError};
use crate::core::{Provider, RoundFields};
use crate::models::{BillBase, BillId, NatGasBillData, TaxRelatedCost};
use crate::store::{BillRepository, RealEstateRepository};
use rust_decimal::Decimal;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
struct Tier {
    therms: Decimal,
    rate: Decimal,
    cost: Decimal,
}

impl Tier {
    fn read(table: &TextTable, anchor: &'static str) -> Result<Self, ImportError> {
        Ok(Tier {
            therms: table.quantity(anchor, 0)?,
            rate: table.amount(anchor, 1)?,
            cost: table.amount(anchor, 2)?,
        })
    }

    fn read_optional(table: &TextTable, anchor: &'static str) -> Result<Self, ImportError> {
        if table.has_row(anchor) {
            Self::read(table, anchor)
        } else {
            Ok(Tier::default())
        }
    }
}

/// A tax row is `[rate] amount`.
fn sales_tax(
    table: &TextTable,
    anchor: &'static str,
) -> Result<(Option<Decimal>, Decimal), ImportError> {
    let row = table.row(anchor).ok_or(ImportError::MissingAnchor(anchor))?;
    match row {
        [amount] => Ok((None, parse_amount(amount)?.ok_or(ImportError::MissingValue(anchor))?)),
        [rate, amount, ..] => Ok((
            parse_percent(rate)?,
            parse_amount(amount)?.ok_or(ImportError::MissingValue(anchor))?,
        )),
        [] => Err(ImportError::MissingCell { anchor, index: 0 }),
    }
}

pub fn parse_text(text: &str, source_file: &str) -> Result<NatGasBillData, ImportError> {
    let table = TextTable::parse(text);
    let real_estate = find_address(text, source_file)?;
    let (start_date, end_date) = billing_period(text)?;

    let basic = Tier::read(&table, "Distribution Charges basic")?;
    let next = Tier::read_optional(&table, "Distribution Charges next")?;
    let over = Tier::read_optional(&table, "Distribution Charges over")?;
    let balancing = Tier::read(&table, "Balancing Charge")?;
    let sbc = Tier::read(&table, "Societal Benefits Charge")?;
    let bgss = Tier::read(&table, "Basic Gas Supply Service")?;
    let (sales_tax_rate, delivery_tax) = sales_tax(&table, "Delivery Sales Tax")?;
    let (_, supply_tax) = sales_tax(&table, "Supply Sales Tax")?;

    let mut bill = NatGasBillData {
        base: BillBase {
            real_estate,
            service_provider: Provider::Pseg,
            start_date,
            end_date,
            total_cost: table.amount("Total Charges", 0)?,
            tax_related_cost: Decimal::ZERO,
            paid_date: None,
            notes: None,
            source_file: source_file.to_string(),
        },
        is_actual: true,
        total_therms: table.quantity("Total therms used", 0)?,
        service_charge: table.amount("Service Charge", 0)?,
        basic_therms: basic.therms,
        basic_rate: basic.rate,
        basic_cost: basic.cost,
        next_therms: next.therms,
        next_rate: next.rate,
        next_cost: next.cost,
        over_therms: over.therms,
        over_rate: over.rate,
        over_cost: over.cost,
        distribution_subtotal: Decimal::ZERO,
        balancing_rate: balancing.rate,
        balancing_cost: balancing.cost,
        sbc_rate: sbc.rate,
        sbc_cost: sbc.cost,
        cip_pct: table.percent("Conservation Incentive Program", 0)?,
        cip_cost: table.amount("Conservation Incentive Program", 1)?,
        sales_tax_rate,
        delivery_tax,
        delivery_cost: table.amount("Total Delivery Charges", 0)?,
        bgss_rate: bgss.rate,
        bgss_cost: bgss.cost,
        supply_tax,
        supply_cost: table.amount("Total Supply Charges", 0)?,
        other_cost: table.optional_amount("Other Charges", 0)?.unwrap_or_default(),
    };
    bill.distribution_subtotal =
        bill.service_charge + bill.basic_cost + bill.next_cost + bill.over_cost;
    log::debug!(
        "{}: {} therms, {} to {}",
        source_file,
        bill.total_therms,
        start_date,
        end_date
    );
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
