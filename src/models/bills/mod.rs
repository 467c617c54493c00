//! Bill records. Every bill kind shares [`BillBase`] and implements
//! [`BillRecord`]; [`Bill`] is the sum type the store and reports work with.

mod depreciation;
mod electric;
mod mortgage;
mod natgas;
mod simple;
mod solar;

pub use depreciation::DepreciationBillData;
pub use electric::ElectricBillData;
pub use mortgage::MortgageBillData;
pub use natgas::NatGasBillData;
pub use simple::SimpleBillData;
pub use solar::SolarBillData;

use super::{ensure_date_order, RealEstate, ValidationError};
use crate::core::{round_money, Address, Provider, RoundFields};
use chrono::NaiveDate;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum BillKind {
    Simple,
    Electric,
    NatGas,
    Mortgage,
    Depreciation,
    Solar,
}

impl BillKind {
    pub const ALL: [BillKind; 6] = [
        BillKind::Simple,
        BillKind::Electric,
        BillKind::NatGas,
        BillKind::Mortgage,
        BillKind::Depreciation,
        BillKind::Solar,
    ];

    /// Electric and gas bills carry a full charge breakdown and an
    /// actual/estimate flag.
    pub fn is_complex(self) -> bool {
        matches!(self, BillKind::Electric | BillKind::NatGas)
    }
}

impl fmt::Display for BillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Fields shared by every bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct BillBase {
    pub real_estate: Address,
    pub service_provider: Provider,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[round(dp = 2)]
    pub total_cost: Decimal,
    #[round(dp = 2)]
    pub tax_related_cost: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub source_file: String,
}

impl BillBase {
    pub fn append_note(&mut self, note: &str) {
        match self.notes.as_mut() {
            Some(notes) if !notes.is_empty() => {
                notes.push_str("; ");
                notes.push_str(note);
            }
            _ => self.notes = Some(note.to_string()),
        }
    }
}

/// How the tax related cost of a new bill is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaxRelatedCost {
    /// Use the per-kind default policy.
    #[default]
    Default,
    Explicit(Decimal),
}

/// Behaviour shared by every bill kind.
pub trait BillRecord: RoundFields + Clone {
    const KIND: BillKind;

    fn base(&self) -> &BillBase;

    fn base_mut(&mut self) -> &mut BillBase;

    fn valid_providers() -> &'static [Provider];

    fn validate_service_provider(&self) -> Result<(), ValidationError> {
        let provider = self.base().service_provider;
        if Self::valid_providers().contains(&provider) {
            Ok(())
        } else {
            Err(ValidationError::InvalidProvider {
                provider,
                kind: Self::KIND,
            })
        }
    }

    fn tax_related_cost_default(&self, real_estate: &RealEstate) -> Decimal {
        if real_estate.bill_tax_related {
            self.base().total_cost
        } else {
            Decimal::ZERO
        }
    }

    /// Kind specific invariants, e.g. that charge sections sum to the total.
    fn validate_fields(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let base = self.base();
        ensure_date_order("bill period", base.start_date, base.end_date)?;
        self.validate_service_provider()?;
        self.validate_fields()
    }

    /// Multiply cost and usage fields by `ratio`, re-summing subtotals so the
    /// kind's invariants still hold. Rates are unchanged.
    fn scale(&mut self, ratio: Decimal);

    fn set_tax_related_cost(&mut self, choice: TaxRelatedCost, real_estate: &RealEstate) {
        let cost = match choice {
            TaxRelatedCost::Default => self.tax_related_cost_default(real_estate),
            TaxRelatedCost::Explicit(value) => value,
        };
        self.base_mut().tax_related_cost = cost;
    }

    fn into_bill(self) -> Bill;
}

/// Ensure `actual` equals the sum of `parts`.
pub(crate) fn ensure_sum(
    kind: BillKind,
    field: &'static str,
    actual: Decimal,
    parts: &[Decimal],
) -> Result<(), ValidationError> {
    let expected: Decimal = parts.iter().sum();
    if expected != actual {
        return Err(ValidationError::BillSumMismatch {
            kind,
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Scale a money field and round it back to cents.
pub(crate) fn scale_money(value: &mut Decimal, ratio: Decimal) {
    *value = round_money(*value * ratio);
}

/// A bill of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Bill {
    Simple(SimpleBillData),
    Electric(ElectricBillData),
    NatGas(NatGasBillData),
    Mortgage(MortgageBillData),
    Depreciation(DepreciationBillData),
    Solar(SolarBillData),
}

macro_rules! dispatch {
    ($bill:expr, $data:ident => $body:expr) => {
        match $bill {
            Bill::Simple($data) => $body,
            Bill::Electric($data) => $body,
            Bill::NatGas($data) => $body,
            Bill::Mortgage($data) => $body,
            Bill::Depreciation($data) => $body,
            Bill::Solar($data) => $body,
        }
    };
}

impl Bill {
    pub fn kind(&self) -> BillKind {
        match self {
            Bill::Simple(_) => BillKind::Simple,
            Bill::Electric(_) => BillKind::Electric,
            Bill::NatGas(_) => BillKind::NatGas,
            Bill::Mortgage(_) => BillKind::Mortgage,
            Bill::Depreciation(_) => BillKind::Depreciation,
            Bill::Solar(_) => BillKind::Solar,
        }
    }

    pub fn base(&self) -> &BillBase {
        dispatch!(self, data => data.base())
    }

    pub fn base_mut(&mut self) -> &mut BillBase {
        dispatch!(self, data => data.base_mut())
    }

    /// `Some` for complex bills only.
    pub fn is_actual(&self) -> Option<bool> {
        match self {
            Bill::Electric(data) => Some(data.is_actual),
            Bill::NatGas(data) => Some(data.is_actual),
            _ => None,
        }
    }

    pub fn valid_providers(&self) -> &'static [Provider] {
        match self {
            Bill::Simple(_) => SimpleBillData::valid_providers(),
            Bill::Electric(_) => ElectricBillData::valid_providers(),
            Bill::NatGas(_) => NatGasBillData::valid_providers(),
            Bill::Mortgage(_) => MortgageBillData::valid_providers(),
            Bill::Depreciation(_) => DepreciationBillData::valid_providers(),
            Bill::Solar(_) => SolarBillData::valid_providers(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        dispatch!(self, data => data.validate())
    }

    pub fn tax_related_cost_default(&self, real_estate: &RealEstate) -> Decimal {
        dispatch!(self, data => data.tax_related_cost_default(real_estate))
    }

    pub fn set_tax_related_cost(&mut self, choice: TaxRelatedCost, real_estate: &RealEstate) {
        dispatch!(self, data => data.set_tax_related_cost(choice, real_estate))
    }

    pub fn scale(&mut self, ratio: Decimal) {
        dispatch!(self, data => data.scale(ratio))
    }
}

impl RoundFields for Bill {
    fn round_fields(&mut self) {
        dispatch!(self, data => data.round_fields())
    }
}

/// Changes applied by [`modify`].
#[derive(Debug, Clone, PartialEq)]
pub struct BillOverrides {
    pub ratio: Decimal,
    pub real_estate: Option<Address>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// `None` scales the source's tax related cost by `ratio`.
    pub tax_related_cost: Option<TaxRelatedCost>,
}

impl Default for BillOverrides {
    fn default() -> Self {
        BillOverrides {
            ratio: Decimal::ONE,
            real_estate: None,
            start_date: None,
            end_date: None,
            paid_date: None,
            notes: None,
            tax_related_cost: None,
        }
    }
}

/// Build a new bill from `source`: costs and usage scaled by the override
/// ratio, then the remaining overrides applied. `real_estate` must be the
/// property the new bill belongs to. The source is never modified.
pub fn modify(
    source: &Bill,
    overrides: &BillOverrides,
    real_estate: &RealEstate,
) -> Result<Bill, ValidationError> {
    let mut bill = source.clone();
    let scaled_tax_related = round_money(source.base().tax_related_cost * overrides.ratio);
    bill.scale(overrides.ratio);
    {
        let base = bill.base_mut();
        if let Some(address) = overrides.real_estate {
            base.real_estate = address;
        }
        if let Some(start) = overrides.start_date {
            base.start_date = start;
        }
        if let Some(end) = overrides.end_date {
            base.end_date = end;
        }
        if let Some(paid) = overrides.paid_date {
            base.paid_date = Some(paid);
        }
        if let Some(notes) = &overrides.notes {
            base.notes = Some(notes.clone());
        }
        base.tax_related_cost = scaled_tax_related;
    }
    if let Some(choice) = overrides.tax_related_cost {
        bill.set_tax_related_cost(choice, real_estate);
    }
    bill.round_fields();
    bill.validate()?;
    Ok(bill)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn base(provider: Provider, total: Decimal) -> BillBase {
        BillBase {
            real_estate: Address::BirchLane,
            service_provider: provider,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 29).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            total_cost: total,
            tax_related_cost: Decimal::ZERO,
            paid_date: None,
            notes: None,
            source_file: "test".to_string(),
        }
    }

    pub(crate) fn real_estate(tax_related: bool) -> RealEstate {
        RealEstate {
            address: Address::BirchLane,
            units: 2,
            square_feet: 1800,
            purchase_date: NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
            bill_tax_related: tax_related,
        }
    }

    #[test]
    fn modify_scales_and_leaves_source_untouched() {
        let mut data = SimpleBillData {
            base: base(Provider::NjAmericanWater, dec!(101.01)),
        };
        data.base.tax_related_cost = dec!(101.01);
        let source = data.into_bill();
        let overrides = BillOverrides {
            ratio: dec!(0.5),
            real_estate: Some(Address::ElmStreet),
            notes: Some("split with unit 2".to_string()),
            ..Default::default()
        };
        let modified = modify(&source, &overrides, &real_estate(true)).unwrap();

        assert_eq!(modified.base().total_cost, dec!(50.51));
        assert_eq!(modified.base().tax_related_cost, dec!(50.51));
        assert_eq!(modified.base().real_estate, Address::ElmStreet);
        assert_eq!(source.base().total_cost, dec!(101.01));
        assert_eq!(source.base().real_estate, Address::BirchLane);
        assert_eq!(source.base().notes, None);
    }

    #[test]
    fn modify_with_default_tax_related_cost() {
        let source = SimpleBillData {
            base: base(Provider::Verizon, dec!(80)),
        }
        .into_bill();
        let overrides = BillOverrides {
            tax_related_cost: Some(TaxRelatedCost::Default),
            ..Default::default()
        };
        let modified = modify(&source, &overrides, &real_estate(true)).unwrap();
        assert_eq!(modified.base().tax_related_cost, dec!(80));
        let modified = modify(&source, &overrides, &real_estate(false)).unwrap();
        assert_eq!(modified.base().tax_related_cost, dec!(0));
    }

    #[test]
    fn append_note_joins_existing_notes() {
        let mut b = base(Provider::Pseg, dec!(1));
        b.append_note("first");
        b.append_note("second");
        assert_eq!(b.notes.as_deref(), Some("first; second"));
    }

    #[test]
    fn complex_kinds() {
        let complex: Vec<_> = BillKind::ALL.into_iter().filter(|k| k.is_complex()).collect();
        assert_eq!(complex, vec![BillKind::Electric, BillKind::NatGas]);
    }
}
