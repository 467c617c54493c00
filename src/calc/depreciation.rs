//! Straight-line MACRS depreciation.
//!
//! The ratio for a tax year is the number of months in service during that
//! year divided by the recovery period in months. Business use is applied
//! afterwards, to stored bills, with [`apply_period_usage_to_bills`].

use super::CalcError;
use crate::core::{
    round_money, Convention, DepreciationMethod, DepreciationParams, DepreciationSystem,
    PropertyClass, Provider, RoundFields,
};
use crate::models::{
    Bill, BillBase, BillId, BillRecord, DepreciationBillData, PropertyId, RealPropertyValue,
    TaxRelatedCost,
};
use crate::store::{BillRepository, RealEstateRepository};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Appended to the notes of a bill once its usage share has been applied.
pub const USAGE_APPLIED_NOTE: &str = "period usage applied";

/// Recovery period in years; `None` when the property is never depreciated.
pub fn recovery_period(class: PropertyClass, system: DepreciationSystem) -> Option<Decimal> {
    use DepreciationSystem::{Ads, Gds};
    use PropertyClass::{
        FiveYear, Land, LandImprovement, NonresidentialReal, ResidentialRental, SevenYear,
    };
    let years = match (class, system) {
        (_, DepreciationSystem::None) | (PropertyClass::None, _) | (Land, _) => return None,
        (ResidentialRental, Gds) => dec!(27.5),
        (ResidentialRental, Ads) => dec!(30),
        (NonresidentialReal, Gds) => dec!(39),
        (NonresidentialReal, Ads) => dec!(40),
        (LandImprovement, Gds) => dec!(15),
        (LandImprovement, Ads) => dec!(20),
        (FiveYear, Gds) => dec!(5),
        (FiveYear, Ads) => dec!(9),
        (SevenYear, Gds) => dec!(7),
        (SevenYear, Ads) => dec!(12),
    };
    Some(years)
}

/// Months from the start of the year at which `date` starts or stops
/// counting. Mid-month counts the month as half; full-month starts at the
/// beginning of the purchase month and stops at the beginning of the
/// disposal month.
fn month_position(date: NaiveDate, convention: Convention) -> Decimal {
    let month_start = Decimal::from(date.month0());
    match convention {
        Convention::MidMonth => month_start + dec!(0.5),
        Convention::FullMonth | Convention::None => month_start,
    }
}

/// Share of the cost basis depreciated in `tax_year`.
pub fn depreciation_ratio_for_tax_year(
    params: DepreciationParams,
    purchase_date: NaiveDate,
    disposal_date: Option<NaiveDate>,
    tax_year: i32,
) -> Decimal {
    if params.has_none() || params.method != DepreciationMethod::StraightLine {
        return Decimal::ZERO;
    }
    let Some(period) = recovery_period(params.property_class, params.system) else {
        return Decimal::ZERO;
    };
    if disposal_date.is_some_and(|d| d.year() == purchase_date.year()) {
        return Decimal::ZERO;
    }
    if purchase_date.year() > tax_year {
        return Decimal::ZERO;
    }

    let start = if purchase_date.year() == tax_year {
        month_position(purchase_date, params.convention)
    } else {
        Decimal::ZERO
    };
    let end = match disposal_date {
        Some(d) if d.year() < tax_year => return Decimal::ZERO,
        Some(d) if d.year() == tax_year => month_position(d, params.convention),
        _ => dec!(12),
    };
    if end <= start {
        return Decimal::ZERO;
    }
    (end - start) / (period * dec!(12))
}

/// Depreciation of one property for one tax year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearDepreciation {
    /// Amount to claim for the year.
    pub year: Decimal,
    /// Basis not yet depreciated before this year.
    pub remaining: Decimal,
    /// Amount implied by the ratio alone.
    pub max_possible: Decimal,
}

/// `prior` is the depreciation already claimed in earlier years. Only
/// finished years can be calculated.
pub fn calculate_depreciation_for_year(
    property: &RealPropertyValue,
    tax_year: i32,
    prior: Decimal,
    today: NaiveDate,
) -> Result<YearDepreciation, CalcError> {
    if tax_year >= today.year() {
        return Err(CalcError::TaxYearNotPast {
            tax_year,
            current_year: today.year(),
        });
    }
    let ratio = depreciation_ratio_for_tax_year(
        property.depreciation_class.params(),
        property.purchase_date,
        property.disposal_date,
        tax_year,
    );
    let max_possible = round_money(property.cost_basis * ratio);
    let remaining = (property.cost_basis - prior).max(Decimal::ZERO);
    Ok(YearDepreciation {
        year: max_possible.min(remaining),
        remaining,
        max_possible,
    })
}

fn tax_year_bounds(tax_year: i32) -> Result<(NaiveDate, NaiveDate), CalcError> {
    NaiveDate::from_ymd_opt(tax_year, 1, 1)
        .zip(NaiveDate::from_ymd_opt(tax_year, 12, 31))
        .ok_or(CalcError::InvalidTaxYear(tax_year))
}

fn has_bill_for_year<S: BillRepository>(store: &S, property: PropertyId, tax_year: i32) -> bool {
    store.bills().into_iter().any(|(_, bill)| match bill {
        Bill::Depreciation(d) => d.real_property_value == property && d.tax_year() == tax_year,
        _ => false,
    })
}

/// Create a full-usage depreciation bill for every property with something
/// left to depreciate in `tax_year`. Properties that already have a bill for
/// the year are skipped.
pub fn create_depreciation_bills<S>(
    store: &mut S,
    tax_year: i32,
    today: NaiveDate,
) -> Result<Vec<BillId>, CalcError>
where
    S: RealEstateRepository + BillRepository,
{
    if tax_year >= today.year() {
        return Err(CalcError::TaxYearNotPast {
            tax_year,
            current_year: today.year(),
        });
    }
    let (start_date, end_date) = tax_year_bounds(tax_year)?;
    let properties: Vec<(PropertyId, RealPropertyValue)> = store
        .property_values()
        .into_iter()
        .map(|(id, value)| (id, value.clone()))
        .collect();

    let mut ids = Vec::new();
    for (id, property) in properties {
        if has_bill_for_year(&*store, id, tax_year) {
            log::debug!(
                "{} {} already has a {} bill",
                property.real_estate,
                property.item,
                tax_year
            );
            continue;
        }
        let prior = store.depreciation_before(id, tax_year);
        let amount = calculate_depreciation_for_year(&property, tax_year, prior, today)?;
        if amount.year <= Decimal::ZERO {
            log::debug!("nothing to depreciate for {} {}", property.real_estate, property.item);
            continue;
        }
        let real_estate = store
            .real_estate(property.real_estate)
            .cloned()
            .ok_or(CalcError::RealEstateNotFound(property.real_estate))?;

        let mut bill = DepreciationBillData {
            base: BillBase {
                real_estate: property.real_estate,
                service_provider: Provider::Depreciation,
                start_date,
                end_date,
                total_cost: amount.year,
                tax_related_cost: Decimal::ZERO,
                paid_date: Some(end_date),
                notes: Some(property.item.clone()),
                source_file: format!("calculated {today}"),
            },
            real_property_value: id,
            period_usage_pct: dec!(100),
        };
        bill.set_tax_related_cost(TaxRelatedCost::Default, &real_estate);
        bill.round_fields();
        bill.validate()?;
        let bill_id = store.insert_bill(bill.into_bill())?;
        log::info!(
            "{} {}: depreciation {} for {} ({} remaining)",
            property.real_estate,
            property.item,
            amount.year,
            tax_year,
            amount.remaining - amount.year
        );
        ids.push(bill_id);
    }
    Ok(ids)
}

/// New bills with total and tax related cost scaled by `period_usage_pct`.
pub fn apply_period_usage_to_bills(bills: &[DepreciationBillData]) -> Vec<DepreciationBillData> {
    bills
        .iter()
        .map(|bill| {
            let mut bill = bill.clone();
            let share = bill.period_usage_pct / dec!(100);
            bill.base.total_cost = round_money(bill.base.total_cost * share);
            bill.base.tax_related_cost = round_money(bill.base.tax_related_cost * share);
            bill
        })
        .collect()
}

fn usage_applied(bill: &DepreciationBillData) -> bool {
    bill.base
        .notes
        .as_deref()
        .is_some_and(|notes| notes.contains(USAGE_APPLIED_NOTE))
}

/// Apportion the stored depreciation bills of `tax_year` by their usage
/// share. Bills are marked so a second run leaves them alone.
pub fn apply_period_usage<S: BillRepository>(
    store: &mut S,
    tax_year: i32,
) -> Result<Vec<BillId>, CalcError> {
    let (ids, bills): (Vec<BillId>, Vec<DepreciationBillData>) = store
        .bills()
        .into_iter()
        .filter_map(|(id, bill)| match bill {
            Bill::Depreciation(d) if d.tax_year() == tax_year && !usage_applied(d) => {
                Some((id, d.clone()))
            }
            _ => None,
        })
        .unzip();

    for (id, mut bill) in ids.iter().copied().zip(apply_period_usage_to_bills(&bills)) {
        bill.base.append_note(USAGE_APPLIED_NOTE);
        log::debug!("bill {id}: {}% usage, total {}", bill.period_usage_pct, bill.base.total_cost);
        store.replace_bill(id, bill.into_bill())?;
    }
    log::info!("applied period usage to {} depreciation bills", ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Address, DepreciationClass};
    use crate::models::{RealEstate, ServiceProvider};
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn roof() -> RealPropertyValue {
        RealPropertyValue {
            real_estate: Address::BirchLane,
            item: "Roof".to_string(),
            purchase_date: date(2021, 6, 15),
            disposal_date: None,
            cost_basis: dec!(18000),
            depreciation_class: DepreciationClass::ResidentialRentalGds,
        }
    }

    #[test]
    fn recovery_periods() {
        use DepreciationSystem::{Ads, Gds};
        assert_eq!(recovery_period(PropertyClass::ResidentialRental, Gds), Some(dec!(27.5)));
        assert_eq!(recovery_period(PropertyClass::NonresidentialReal, Ads), Some(dec!(40)));
        assert_eq!(recovery_period(PropertyClass::SevenYear, Ads), Some(dec!(12)));
        assert_eq!(recovery_period(PropertyClass::Land, Gds), None);
        assert_eq!(recovery_period(PropertyClass::FiveYear, DepreciationSystem::None), None);
    }

    #[test]
    fn mid_month_counts_half_of_the_purchase_month() {
        let params = DepreciationClass::ResidentialRentalGds.params();
        let purchase = date(2021, 6, 15);
        assert_eq!(
            depreciation_ratio_for_tax_year(params, purchase, None, 2021),
            dec!(6.5) / dec!(330)
        );
        assert_eq!(
            depreciation_ratio_for_tax_year(params, purchase, None, 2022),
            dec!(12) / dec!(330)
        );
        assert_eq!(depreciation_ratio_for_tax_year(params, purchase, None, 2020), dec!(0));
        // Disposed in March: two and a half months.
        assert_eq!(
            depreciation_ratio_for_tax_year(params, purchase, Some(date(2024, 3, 2)), 2024),
            dec!(2.5) / dec!(330)
        );
        assert_eq!(
            depreciation_ratio_for_tax_year(params, purchase, Some(date(2024, 3, 2)), 2025),
            dec!(0)
        );
    }

    #[test]
    fn full_month_counts_purchase_month_but_not_disposal_month() {
        let params = DepreciationClass::FiveYearGds.params();
        let purchase = date(2022, 3, 10);
        let disposal = Some(date(2024, 8, 1));
        assert_eq!(
            depreciation_ratio_for_tax_year(params, purchase, disposal, 2022),
            dec!(10) / dec!(60)
        );
        assert_eq!(
            depreciation_ratio_for_tax_year(params, purchase, disposal, 2024),
            dec!(7) / dec!(60)
        );
    }

    #[test]
    fn no_depreciation_cases() {
        let purchase = date(2022, 3, 10);
        for class in [DepreciationClass::None, DepreciationClass::Land] {
            assert_eq!(
                depreciation_ratio_for_tax_year(class.params(), purchase, None, 2023),
                dec!(0)
            );
        }
        // Bought and disposed of in the same year.
        assert_eq!(
            depreciation_ratio_for_tax_year(
                DepreciationClass::SevenYearGds.params(),
                purchase,
                Some(date(2022, 11, 1)),
                2022
            ),
            dec!(0)
        );
    }

    #[test]
    fn current_year_cannot_be_calculated() {
        let today = date(2024, 3, 1);
        assert!(matches!(
            calculate_depreciation_for_year(&roof(), 2024, dec!(0), today),
            Err(CalcError::TaxYearNotPast {
                tax_year: 2024,
                current_year: 2024
            })
        ));
        assert!(calculate_depreciation_for_year(&roof(), 2025, dec!(0), today).is_err());
    }

    #[test]
    fn year_is_capped_by_remaining_basis() {
        let today = date(2025, 1, 2);
        let full = calculate_depreciation_for_year(&roof(), 2022, dec!(354.55), today).unwrap();
        assert_eq!(full.max_possible, dec!(654.55));
        assert_eq!(full.year, dec!(654.55));
        assert_eq!(full.remaining, dec!(17645.45));

        let nearly_done =
            calculate_depreciation_for_year(&roof(), 2024, dec!(17900), today).unwrap();
        assert_eq!(nearly_done.remaining, dec!(100));
        assert_eq!(nearly_done.year, dec!(100));

        let done = calculate_depreciation_for_year(&roof(), 2024, dec!(18500), today).unwrap();
        assert_eq!(done.remaining, dec!(0));
        assert_eq!(done.year, dec!(0));
    }

    fn store() -> (MemoryStore, PropertyId) {
        let mut store = MemoryStore::default();
        store
            .insert_real_estate(RealEstate {
                address: Address::BirchLane,
                units: 2,
                square_feet: 1800,
                purchase_date: date(2019, 4, 1),
                bill_tax_related: false,
            })
            .unwrap();
        store
            .insert_service_provider(ServiceProvider::from(Provider::Depreciation))
            .unwrap();
        let roof = store.insert_property_value(roof()).unwrap();
        store
            .insert_property_value(RealPropertyValue {
                real_estate: Address::BirchLane,
                item: "Lot".to_string(),
                purchase_date: date(2019, 4, 1),
                disposal_date: None,
                cost_basis: dec!(90000),
                depreciation_class: DepreciationClass::Land,
            })
            .unwrap();
        (store, roof)
    }

    #[test]
    fn creates_one_bill_per_depreciable_property() {
        let (mut store, roof) = store();
        let today = date(2024, 3, 1);

        let ids = create_depreciation_bills(&mut store, 2021, today).unwrap();
        assert_eq!(ids.len(), 1);
        let ids = create_depreciation_bills(&mut store, 2022, today).unwrap();
        match store.bill(ids[0]).unwrap() {
            Bill::Depreciation(bill) => {
                assert_eq!(bill.real_property_value, roof);
                assert_eq!(bill.base.total_cost, dec!(654.55));
                assert_eq!(bill.base.tax_related_cost, dec!(654.55));
                assert_eq!(bill.base.paid_date, Some(date(2022, 12, 31)));
            }
            other => panic!("unexpected bill {other:?}"),
        }
        assert_eq!(store.depreciation_before(roof, 2023), dec!(1009.10));

        // Already created for 2022.
        assert!(create_depreciation_bills(&mut store, 2022, today)
            .unwrap()
            .is_empty());
        assert!(create_depreciation_bills(&mut store, 2024, today).is_err());
    }

    #[test]
    fn usage_share_is_applied_once() {
        let (mut store, roof) = store();
        create_depreciation_bills(&mut store, 2022, date(2024, 3, 1)).unwrap();
        let (id, mut bill) = match store.bills()[0] {
            (id, Bill::Depreciation(d)) => (id, d.clone()),
            _ => unreachable!(),
        };
        bill.period_usage_pct = dec!(50);
        store.replace_bill(id, bill.into_bill()).unwrap();

        assert_eq!(apply_period_usage(&mut store, 2022).unwrap(), vec![id]);
        let base = store.bill(id).unwrap().base().clone();
        assert_eq!(base.total_cost, dec!(327.28));
        assert_eq!(base.tax_related_cost, dec!(327.28));
        assert_eq!(base.notes.as_deref(), Some("Roof; period usage applied"));

        assert!(apply_period_usage(&mut store, 2022).unwrap().is_empty());
        assert_eq!(store.depreciation_before(roof, 2023), dec!(327.28));
    }
}
