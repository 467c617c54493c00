//! Estimated utility bills. An actual bill is re-priced with a different
//! usage under the tariffs in force during its billing period; the usual
//! case is adding back the kWh the solar panels covered.

use super::CalcError;
use crate::core::{round_dp, round_money, Address, RoundFields};
use crate::importers::solar::{in_period, HourlySolar};
use crate::models::{
    Bill, BillId, BillKind, BillRecord, ElectricBillData, ElectricData, NatGasBillData,
    NatGasData, RealEstate, TaxRelatedCost, UtilityData, YearMonth,
};
use crate::store::{BillRepository, RealEstateRepository, UtilityDataRepository};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Sales tax assumed for gas bills that do not print their rate.
pub const DEFAULT_GAS_SALES_TAX_RATE: Decimal = dec!(0.025);

/// Weight of the end month's tariff: `end.day / period days`, clamped to
/// `[0, 1]`.
pub fn blend_weight(start_date: NaiveDate, end_date: NaiveDate) -> Result<Decimal, CalcError> {
    let days = (end_date - start_date).num_days();
    if days == 0 {
        return Err(CalcError::ZeroLengthPeriod {
            start: start_date,
            end: end_date,
        });
    }
    let w = Decimal::from(end_date.day()) / Decimal::from(days);
    Ok(w.clamp(Decimal::ZERO, Decimal::ONE))
}

/// Tariff for a billing period, each field at its stored precision.
pub fn blended_rates<T: UtilityData + RoundFields>(start: &T, end: &T, w: Decimal) -> T {
    T::blend(start, end, w).rounded()
}

fn cost(quantity: Decimal, rate: Decimal) -> Decimal {
    round_money(quantity * rate)
}

/// `actual + delta` at the precision usage is billed in.
fn usage(actual: Decimal, delta: Decimal, dp: u32) -> Result<Decimal, CalcError> {
    let usage = round_dp(actual + delta, dp);
    if usage < Decimal::ZERO {
        return Err(CalcError::NegativeUsage(usage));
    }
    Ok(usage)
}

pub fn estimate_electric(
    actual: &ElectricBillData,
    start_rates: &ElectricData,
    end_rates: &ElectricData,
    delta_kwh: Decimal,
    real_estate: &RealEstate,
) -> Result<ElectricBillData, CalcError> {
    let base = &actual.base;
    let w = blend_weight(base.start_date, base.end_date)?;
    let rates = blended_rates(start_rates, end_rates, w);

    let total_kwh = usage(actual.total_kwh, delta_kwh, 0)?;
    let eh_kwh = actual.eh_kwh;
    let non_heat_kwh = usage(total_kwh, -eh_kwh, 0)?;

    let mut bill = actual.clone();
    bill.is_actual = false;
    bill.total_kwh = total_kwh;
    bill.base.paid_date = None;
    bill.base.notes = None;
    bill.base.append_note(&format!(
        "estimate: {total_kwh} kWh, {delta_kwh} kWh over actual"
    ));

    // Delivery
    bill.service_charge = rates.service_charge;
    bill.dist_first_kwh = non_heat_kwh.min(rates.first_kwh);
    bill.dist_first_rate = rates.dist_first_rate;
    bill.dist_first_cost = cost(bill.dist_first_kwh, rates.dist_first_rate);
    bill.dist_next_kwh = non_heat_kwh - bill.dist_first_kwh;
    bill.dist_next_rate = rates.dist_next_rate;
    bill.dist_next_cost = cost(bill.dist_next_kwh, rates.dist_next_rate);
    bill.eh_rate = rates.eh_rate;
    bill.eh_cost = cost(eh_kwh, rates.eh_rate);
    bill.distribution_subtotal =
        bill.service_charge + bill.dist_first_cost + bill.dist_next_cost + bill.eh_cost;
    bill.sbc_rate = rates.sbc_rate;
    bill.sbc_cost = cost(total_kwh, rates.sbc_rate);
    bill.zec_rate = rates.zec_rate;
    bill.zec_cost = cost(total_kwh, rates.zec_rate);
    bill.gpc_rate = rates.gpc_rate;
    bill.gpc_cost = cost(total_kwh, rates.gpc_rate);
    bill.tac_pct = rates.tac_pct;
    bill.tac_cost = cost(bill.distribution_subtotal, rates.tac_pct);
    let delivery_before_tax = bill.distribution_subtotal
        + bill.sbc_cost
        + bill.zec_cost
        + bill.gpc_cost
        + bill.tac_cost;
    bill.delivery_tax = cost(delivery_before_tax, bill.sales_tax_rate);

    // Supply
    bill.supply_first_kwh = total_kwh.min(rates.first_kwh);
    bill.supply_first_rate = rates.supply_first_rate;
    bill.supply_first_cost = cost(bill.supply_first_kwh, rates.supply_first_rate);
    bill.supply_next_kwh = total_kwh - bill.supply_first_kwh;
    bill.supply_next_rate = rates.supply_next_rate;
    bill.supply_next_cost = cost(bill.supply_next_kwh, rates.supply_next_rate);
    bill.transmission_rate = rates.transmission_rate;
    bill.transmission_cost = cost(total_kwh, rates.transmission_rate);
    let supply_before_tax =
        bill.supply_first_cost + bill.supply_next_cost + bill.transmission_cost;
    bill.supply_tax = cost(supply_before_tax, bill.sales_tax_rate);

    bill.resum();
    bill.set_tax_related_cost(TaxRelatedCost::Default, real_estate);
    bill.round_fields();
    bill.validate()?;
    Ok(bill)
}

pub fn estimate_natgas(
    actual: &NatGasBillData,
    start_rates: &NatGasData,
    end_rates: &NatGasData,
    delta_therms: Decimal,
    real_estate: &RealEstate,
) -> Result<NatGasBillData, CalcError> {
    let base = &actual.base;
    let w = blend_weight(base.start_date, base.end_date)?;
    let rates = blended_rates(start_rates, end_rates, w);
    let total_therms = usage(actual.total_therms, delta_therms, 1)?;

    let mut bill = actual.clone();
    bill.is_actual = false;
    bill.total_therms = total_therms;
    bill.base.paid_date = None;
    bill.base.notes = None;
    bill.base.append_note(&format!(
        "estimate: {total_therms} therms, {delta_therms} therms over actual"
    ));
    let tax_rate = match actual.sales_tax_rate {
        Some(rate) => rate,
        None => {
            bill.base.append_note("sales tax rate not on the actual bill, 2.5% assumed");
            DEFAULT_GAS_SALES_TAX_RATE
        }
    };

    // Tier thresholds are cumulative.
    bill.service_charge = rates.service_charge;
    bill.basic_therms = total_therms.min(rates.basic_therms);
    bill.basic_rate = rates.basic_rate;
    bill.basic_cost = cost(bill.basic_therms, rates.basic_rate);
    bill.next_therms = (total_therms.min(rates.next_therms) - bill.basic_therms).max(Decimal::ZERO);
    bill.next_rate = rates.next_rate;
    bill.next_cost = cost(bill.next_therms, rates.next_rate);
    bill.over_therms = total_therms - bill.basic_therms - bill.next_therms;
    bill.over_rate = rates.over_rate;
    bill.over_cost = cost(bill.over_therms, rates.over_rate);
    bill.distribution_subtotal =
        bill.service_charge + bill.basic_cost + bill.next_cost + bill.over_cost;
    bill.balancing_rate = rates.balancing_rate;
    bill.balancing_cost = cost(total_therms, rates.balancing_rate);
    bill.sbc_rate = rates.sbc_rate;
    bill.sbc_cost = cost(total_therms, rates.sbc_rate);
    bill.cip_pct = rates.cip_pct;
    bill.cip_cost = cost(bill.distribution_subtotal, rates.cip_pct);
    let delivery_before_tax =
        bill.distribution_subtotal + bill.balancing_cost + bill.sbc_cost + bill.cip_cost;
    bill.delivery_tax = cost(delivery_before_tax, tax_rate);

    bill.bgss_rate = rates.bgss_rate;
    bill.bgss_cost = cost(total_therms, rates.bgss_rate);
    bill.supply_tax = cost(bill.bgss_cost, tax_rate);

    bill.resum();
    bill.set_tax_related_cost(TaxRelatedCost::Default, real_estate);
    bill.round_fields();
    bill.validate()?;
    Ok(bill)
}

fn missing_rates(kind: BillKind, real_estate: Address, date: NaiveDate) -> CalcError {
    CalcError::MissingRates {
        kind,
        real_estate,
        month: YearMonth::of(date),
    }
}

fn actual_bill<S: BillRepository>(
    store: &S,
    id: BillId,
    kind: BillKind,
) -> Result<Bill, CalcError> {
    let bill = store.bill(id).ok_or(CalcError::BillNotFound(id))?;
    if bill.kind() != kind {
        return Err(CalcError::WrongBillKind {
            id,
            expected: kind,
            actual: bill.kind(),
        });
    }
    if bill.is_actual() != Some(true) {
        return Err(CalcError::NotActual(id));
    }
    Ok(bill.clone())
}

fn property<S: RealEstateRepository>(store: &S, address: Address) -> Result<RealEstate, CalcError> {
    store
        .real_estate(address)
        .cloned()
        .ok_or(CalcError::RealEstateNotFound(address))
}

/// Estimate the electric bill `actual_id` with `delta_kwh` added and store it.
pub fn create_electric_estimate<S>(
    store: &mut S,
    actual_id: BillId,
    delta_kwh: Decimal,
) -> Result<BillId, CalcError>
where
    S: BillRepository + UtilityDataRepository + RealEstateRepository,
{
    let Bill::Electric(actual) = actual_bill(&*store, actual_id, BillKind::Electric)? else {
        return Err(CalcError::BillNotFound(actual_id));
    };
    let base = &actual.base;
    let start_rates = store
        .electric_data(base.real_estate, YearMonth::of(base.start_date))
        .ok_or_else(|| missing_rates(BillKind::Electric, base.real_estate, base.start_date))?;
    let end_rates = store
        .electric_data(base.real_estate, YearMonth::of(base.end_date))
        .ok_or_else(|| missing_rates(BillKind::Electric, base.real_estate, base.end_date))?;
    let real_estate = property(&*store, base.real_estate)?;

    let estimate = estimate_electric(&actual, start_rates, end_rates, delta_kwh, &real_estate)?;
    log::info!(
        "estimated bill {}: {} kWh, total {} (actual {})",
        actual_id,
        estimate.total_kwh,
        estimate.base.total_cost,
        actual.base.total_cost
    );
    Ok(store.insert_bill(estimate.into_bill())?)
}

/// Estimate the gas bill `actual_id` with `delta_therms` added and store it.
pub fn create_natgas_estimate<S>(
    store: &mut S,
    actual_id: BillId,
    delta_therms: Decimal,
) -> Result<BillId, CalcError>
where
    S: BillRepository + UtilityDataRepository + RealEstateRepository,
{
    let Bill::NatGas(actual) = actual_bill(&*store, actual_id, BillKind::NatGas)? else {
        return Err(CalcError::BillNotFound(actual_id));
    };
    let base = &actual.base;
    let start_rates = store
        .natgas_data(base.real_estate, YearMonth::of(base.start_date))
        .ok_or_else(|| missing_rates(BillKind::NatGas, base.real_estate, base.start_date))?;
    let end_rates = store
        .natgas_data(base.real_estate, YearMonth::of(base.end_date))
        .ok_or_else(|| missing_rates(BillKind::NatGas, base.real_estate, base.end_date))?;
    let real_estate = property(&*store, base.real_estate)?;

    let estimate = estimate_natgas(&actual, start_rates, end_rates, delta_therms, &real_estate)?;
    log::info!(
        "estimated bill {}: {} therms, total {} (actual {})",
        actual_id,
        estimate.total_therms,
        estimate.base.total_cost,
        actual.base.total_cost
    );
    Ok(store.insert_bill(estimate.into_bill())?)
}

/// kWh produced and used on site within `start..=end`: production less
/// export.
pub fn solar_offset_kwh(hourly: &[HourlySolar], start: NaiveDate, end: NaiveDate) -> Decimal {
    in_period(hourly, start, end)
        .map(|hour| hour.production - hour.export)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Provider;
    use crate::importers::{pseg_electric, pseg_gas};
    use crate::models::ServiceProvider;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn birch_lane() -> RealEstate {
        RealEstate {
            address: Address::BirchLane,
            units: 2,
            square_feet: 1800,
            purchase_date: date(2019, 4, 1),
            bill_tax_related: true,
        }
    }

    fn electric_rates(
        month: u32,
        dist: [Decimal; 2],
        sbc: Decimal,
        gpc: Decimal,
        supply: [Decimal; 2],
        transmission: Decimal,
    ) -> ElectricData {
        ElectricData {
            real_estate: Address::BirchLane,
            month: YearMonth::new(2024, month).unwrap(),
            service_charge: dec!(6.96),
            first_kwh: dec!(600),
            dist_first_rate: dist[0],
            dist_next_rate: dist[1],
            eh_rate: dec!(0.0615),
            sbc_rate: sbc,
            zec_rate: dec!(0.004),
            gpc_rate: gpc,
            tac_pct: dec!(-0.01),
            supply_first_rate: supply[0],
            supply_next_rate: supply[1],
            transmission_rate: transmission,
        }
    }

    fn may() -> ElectricData {
        electric_rates(
            5,
            [dec!(0.069711), dec!(0.077381)],
            dec!(0.008913),
            dec!(0.00138),
            [dec!(0.10134), dec!(0.11022)],
            dec!(0.022),
        )
    }

    fn june() -> ElectricData {
        electric_rates(
            6,
            [dec!(0.0712), dec!(0.079)],
            dec!(0.0091),
            dec!(0.0014),
            [dec!(0.1121), dec!(0.1212)],
            dec!(0.0231),
        )
    }

    #[test]
    fn weight_is_the_end_month_share() {
        let w = blend_weight(date(2024, 5, 29), date(2024, 6, 27)).unwrap();
        assert_eq!(w, Decimal::from(27) / Decimal::from(29));
        // A period inside one month is priced at that month.
        assert_eq!(blend_weight(date(2024, 6, 1), date(2024, 6, 27)).unwrap(), dec!(1));
        assert!(matches!(
            blend_weight(date(2024, 6, 1), date(2024, 6, 1)),
            Err(CalcError::ZeroLengthPeriod { .. })
        ));
    }

    #[test]
    fn blended_rates_are_rounded() {
        let w = blend_weight(date(2024, 5, 29), date(2024, 6, 27)).unwrap();
        let rates = blended_rates(&may(), &june(), w);
        assert_eq!(rates.dist_first_rate, dec!(0.071097));
        assert_eq!(rates.supply_first_rate, dec!(0.111358));
        assert_eq!(rates.first_kwh, dec!(600));
        assert_eq!(rates.month, YearMonth::new(2024, 6).unwrap());
    }

    #[test]
    fn electric_estimate_with_added_usage() {
        let actual = pseg_electric::parse_text(pseg_electric::tests::BILL, "pseg.pdf").unwrap();
        let estimate =
            estimate_electric(&actual, &may(), &june(), dec!(300), &birch_lane()).unwrap();

        assert!(!estimate.is_actual);
        assert_eq!(estimate.total_kwh, dec!(846));
        assert_eq!(estimate.dist_first_kwh, dec!(600));
        assert_eq!(estimate.dist_next_kwh, dec!(246));
        assert_eq!(estimate.dist_first_cost, dec!(42.66));
        assert_eq!(estimate.dist_next_cost, dec!(19.41));
        assert_eq!(estimate.distribution_subtotal, dec!(69.03));
        assert_eq!(estimate.tac_cost, dec!(-0.69));
        assert_eq!(estimate.delivery_tax, dec!(5.34));
        assert_eq!(estimate.delivery_cost, dec!(85.93));
        assert_eq!(estimate.supply_next_cost, dec!(29.63));
        assert_eq!(estimate.supply_tax, dec!(7.68));
        assert_eq!(estimate.supply_cost, dec!(123.60));
        assert_eq!(estimate.base.total_cost, dec!(209.53));
        assert_eq!(estimate.base.tax_related_cost, dec!(209.53));
        assert_eq!(estimate.sales_tax_rate, actual.sales_tax_rate);
        // The actual bill is untouched.
        assert_eq!(actual.base.total_cost, dec!(127.64));
    }

    #[test]
    fn electric_estimate_without_delta_reprices_actual_usage() {
        let actual = pseg_electric::parse_text(pseg_electric::tests::BILL, "pseg.pdf").unwrap();
        let estimate = estimate_electric(&actual, &may(), &june(), dec!(0), &birch_lane()).unwrap();
        assert_eq!(estimate.distribution_subtotal, dec!(45.78));
        assert_eq!(estimate.delivery_cost, dec!(56.75));
        assert_eq!(estimate.supply_cost, dec!(78.23));
        assert_eq!(estimate.base.total_cost, dec!(134.98));
    }

    #[test]
    fn negative_usage_is_rejected() {
        let actual = pseg_electric::parse_text(pseg_electric::tests::BILL, "pseg.pdf").unwrap();
        assert!(matches!(
            estimate_electric(&actual, &may(), &june(), dec!(-600), &birch_lane()),
            Err(CalcError::NegativeUsage(_))
        ));
    }

    fn gas_rates(month: u32, tiers: [Decimal; 3], balancing: Decimal, bgss: Decimal) -> NatGasData {
        NatGasData {
            real_estate: Address::ElmStreet,
            month: YearMonth::new(2024, month).unwrap(),
            service_charge: dec!(8.62),
            basic_therms: dec!(50),
            next_therms: dec!(100),
            basic_rate: tiers[0],
            next_rate: tiers[1],
            over_rate: tiers[2],
            balancing_rate: balancing,
            sbc_rate: dec!(0.0521),
            cip_pct: dec!(0.012),
            bgss_rate: bgss,
        }
    }

    #[test]
    fn gas_estimate_assumes_tax_rate_when_missing() {
        let actual = pseg_gas::parse_text(pseg_gas::tests::BILL, "gas.pdf").unwrap();
        let january = gas_rates(
            1,
            [dec!(0.4123), dec!(0.3981), dec!(0.371)],
            dec!(0.0899),
            dec!(0.402),
        );
        let february = gas_rates(
            2,
            [dec!(0.42), dec!(0.405), dec!(0.38)],
            dec!(0.091),
            dec!(0.395),
        );
        let mut elm_street = birch_lane();
        elm_street.address = Address::ElmStreet;
        elm_street.bill_tax_related = false;

        let estimate =
            estimate_natgas(&actual, &january, &february, dec!(20), &elm_street).unwrap();
        assert_eq!(estimate.total_therms, dec!(84.0));
        assert_eq!(estimate.basic_therms, dec!(50.0));
        assert_eq!(estimate.next_therms, dec!(34.0));
        assert_eq!(estimate.over_therms, dec!(0.0));
        assert_eq!(estimate.distribution_subtotal, dec!(42.94));
        assert_eq!(estimate.cip_cost, dec!(0.52));
        assert_eq!(estimate.delivery_tax, dec!(1.39));
        assert_eq!(estimate.delivery_cost, dec!(56.81));
        assert_eq!(estimate.supply_cost, dec!(34.45));
        assert_eq!(estimate.other_cost, dec!(1.00));
        assert_eq!(estimate.base.total_cost, dec!(92.26));
        assert_eq!(estimate.base.tax_related_cost, dec!(0));
        assert_eq!(estimate.sales_tax_rate, None);
        assert!(estimate
            .base
            .notes
            .as_deref()
            .is_some_and(|n| n.contains("2.5% assumed")));
    }

    #[test]
    fn stored_estimate_needs_both_months_of_rates() {
        let mut store = MemoryStore::default();
        store.insert_real_estate(birch_lane()).unwrap();
        store
            .insert_service_provider(ServiceProvider::from(Provider::Pseg))
            .unwrap();
        let actual = pseg_electric::parse_text(pseg_electric::tests::BILL, "pseg.pdf").unwrap();
        let actual_id = store.insert_bill(actual.into_bill()).unwrap();
        store.insert_electric_data(may()).unwrap();

        match create_electric_estimate(&mut store, actual_id, dec!(300)) {
            Err(CalcError::MissingRates { month, .. }) => {
                assert_eq!(month, YearMonth::new(2024, 6).unwrap())
            }
            other => panic!("expected missing rates, got {other:?}"),
        }

        store.insert_electric_data(june()).unwrap();
        let id = create_electric_estimate(&mut store, actual_id, dec!(300)).unwrap();
        assert_eq!(store.bill(id).unwrap().is_actual(), Some(false));
        assert_eq!(store.bill(id).unwrap().base().total_cost, dec!(209.53));
        assert!(matches!(
            create_electric_estimate(&mut store, id, dec!(1)),
            Err(CalcError::NotActual(_))
        ));
    }

    #[test]
    fn solar_offset_is_production_less_export() {
        let hour = |day: u32, production: Decimal, export: Decimal| HourlySolar {
            timestamp: date(2024, 6, day).and_hms_opt(12, 0, 0).unwrap(),
            production,
            consumption: dec!(0.8),
            export,
            import: dec!(0),
        };
        let hourly = vec![
            hour(1, dec!(1.5), dec!(0.5)),
            hour(2, dec!(2.0), dec!(0.25)),
            hour(3, dec!(9.0), dec!(0)),
        ];
        assert_eq!(
            solar_offset_kwh(&hourly, date(2024, 6, 1), date(2024, 6, 2)),
            dec!(2.75)
        );
    }
}
