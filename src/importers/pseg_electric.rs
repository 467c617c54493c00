//! PSE&G electric bill PDF.
//!
//! ```text
//! Service address                 12 Birch Lane, Maplewood, NJ 07040
//! Billing period                  May 29, 2024 to Jun 27, 2024
//! Total kWh used                  546 kWh
//! Service Charge                                          $6.96
//! Distribution Charges first      546 kWh    $0.069711    $38.06
//! Tax Adjustment Credit           -1.0000%                -$0.45
//! Total Charges                                         $127.64
//! ```

use super::pdf::{billing_period, find_address, read_pdf_text, TextTable};
use super::{store_bill, ImportError};
use crate::core::{Provider, RoundFields};
use crate::models::{BillBase, BillId, ElectricBillData, TaxRelatedCost};
use crate::store::{BillRepository, RealEstateRepository};
use rust_decimal::Decimal;
use std::path::Path;

/// Usage, rate and cost of a per kWh line.
#[derive(Debug, Default, Clone, Copy)]
struct Line {
    kwh: Decimal,
    rate: Decimal,
    cost: Decimal,
}

impl Line {
    fn read(table: &TextTable, anchor: &'static str) -> Result<Self, ImportError> {
        Ok(Line {
            kwh: table.quantity(anchor, 0)?,
            rate: table.amount(anchor, 1)?,
            cost: table.amount(anchor, 2)?,
        })
    }

    /// Tiers a bill does not reach are left off the statement.
    fn read_optional(table: &TextTable, anchor: &'static str) -> Result<Self, ImportError> {
        if table.has_row(anchor) {
            Self::read(table, anchor)
        } else {
            Ok(Line::default())
        }
    }
}

pub fn parse_text(text: &str, source_file: &str) -> Result<ElectricBillData, ImportError> {
    let table = TextTable::parse(text);
    let real_estate = find_address(text, source_file)?;
    let (start_date, end_date) = billing_period(text)?;

    let total_kwh = table.quantity("Total kWh used", 0)?;
    let eh_kwh = if table.has_row("Electric heat kWh") {
        table.quantity("Electric heat kWh", 0)?
    } else {
        Decimal::ZERO
    };
    let dist_first = Line::read(&table, "Distribution Charges first")?;
    let dist_next = Line::read_optional(&table, "Distribution Charges next")?;
    let heat = Line::read_optional(&table, "Electric Heat")?;
    let sbc = Line::read(&table, "Societal Benefits Charge")?;
    let zec = Line::read(&table, "Zero Emission Certificate")?;
    let gpc = Line::read(&table, "Green Programs Recovery")?;
    let supply_first = Line::read(&table, "Basic Generation Service first")?;
    let supply_next = Line::read_optional(&table, "Basic Generation Service next")?;
    let transmission = Line::read(&table, "Transmission Charge")?;

    let mut bill = ElectricBillData {
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
        total_kwh,
        eh_kwh,
        service_charge: table.amount("Service Charge", 0)?,
        dist_first_kwh: dist_first.kwh,
        dist_first_rate: dist_first.rate,
        dist_first_cost: dist_first.cost,
        dist_next_kwh: dist_next.kwh,
        dist_next_rate: dist_next.rate,
        dist_next_cost: dist_next.cost,
        eh_rate: heat.rate,
        eh_cost: heat.cost,
        distribution_subtotal: Decimal::ZERO,
        sbc_rate: sbc.rate,
        sbc_cost: sbc.cost,
        zec_rate: zec.rate,
        zec_cost: zec.cost,
        gpc_rate: gpc.rate,
        gpc_cost: gpc.cost,
        tac_pct: table.percent("Tax Adjustment Credit", 0)?,
        tac_cost: table.amount("Tax Adjustment Credit", 1)?,
        sales_tax_rate: table.percent("Delivery Sales Tax", 0)?,
        delivery_tax: table.amount("Delivery Sales Tax", 1)?,
        delivery_cost: table.amount("Total Delivery Charges", 0)?,
        supply_first_kwh: supply_first.kwh,
        supply_first_rate: supply_first.rate,
        supply_first_cost: supply_first.cost,
        supply_next_kwh: supply_next.kwh,
        supply_next_rate: supply_next.rate,
        supply_next_cost: supply_next.cost,
        transmission_rate: transmission.rate,
        transmission_cost: transmission.cost,
        supply_tax: table.amount("Supply Sales Tax", 1)?,
        supply_cost: table.amount("Total Supply Charges", 0)?,
        other_cost: table.optional_amount("Other Charges", 0)?.unwrap_or_default(),
    };
    // The statement does not print the distribution subtotal.
    bill.distribution_subtotal = bill.service_charge
        + bill.dist_first_cost
        + bill.dist_next_cost
        + bill.eh_cost;
    log::debug!(
        "{}: {} kWh, {} to {}",
        source_file,
        bill.total_kwh,
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

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::Address;
    use crate::models::{BillRecord, ValidationError};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    pub(crate) const BILL: &str = "
PSE&G   Public Service Electric and Gas Company
Service address     12 Birch Lane, Maplewood, NJ 07040
Billing period      May 29, 2024 to Jun 27, 2024
Total kWh used      546 kWh
Electric heat kWh   0 kWh

Delivery Charges
Service Charge                                              $6.96
Distribution Charges first     546 kWh     $0.069711       $38.06
Societal Benefits Charge       546 kWh     $0.008913        $4.87
Zero Emission Certificate      546 kWh     $0.004000        $2.18
Green Programs Recovery        546 kWh     $0.001380        $0.75
Tax Adjustment Credit          -1.0000%                    -$0.45
Delivery Sales Tax             6.625%                       $3.47
Total Delivery Charges                                     $55.84

Supply Charges
Basic Generation Service first   546 kWh   $0.101340       $55.33
Transmission Charge            546 kWh     $0.022000       $12.01
Supply Sales Tax               6.625%                       $4.46
Total Supply Charges                                       $71.80

Total Charges                                             $127.64
";

    #[test]
    fn parses_statement() {
        let bill = parse_text(BILL, "pseg_2024_06.pdf").unwrap();
        assert_eq!(bill.base.real_estate, Address::BirchLane);
        assert_eq!(bill.base.start_date, NaiveDate::from_ymd_opt(2024, 5, 29).unwrap());
        assert_eq!(bill.base.end_date, NaiveDate::from_ymd_opt(2024, 6, 27).unwrap());
        assert_eq!(bill.total_kwh, dec!(546));
        assert_eq!(bill.dist_next_kwh, dec!(0));
        assert_eq!(bill.tac_pct, dec!(-0.01));
        assert_eq!(bill.sales_tax_rate, dec!(0.06625));
        assert_eq!(bill.distribution_subtotal, dec!(45.02));
        assert_eq!(bill.base.total_cost, dec!(127.64));
        assert_eq!(bill.validate(), Ok(()));
    }

    #[test]
    fn inconsistent_totals_fail_validation() {
        let text = BILL.replace("$127.64", "$127.74");
        let bill = parse_text(&text, "pseg.pdf").unwrap();
        assert!(matches!(
            bill.validate(),
            Err(ValidationError::BillSumMismatch {
                field: "total_cost",
                ..
            })
        ));
    }

    #[test]
    fn unknown_address() {
        let text = BILL.replace("12 Birch Lane", "9 Oak Court");
        assert!(matches!(
            parse_text(&text, "pseg.pdf"),
            Err(ImportError::AddressNotFound(_))
        ));
    }
}
