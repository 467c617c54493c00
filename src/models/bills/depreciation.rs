use super::{scale_money, Bill, BillBase, BillKind, BillRecord};
use crate::core::{Provider, RoundFields};
use crate::models::{ensure_non_negative, PropertyId, RealEstate, ValidationError};
use chrono::Datelike;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One tax year of depreciation for a [`RealPropertyValue`](crate::models::RealPropertyValue).
/// Always covers Jan 1 to Dec 31.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct DepreciationBillData {
    #[round(nested)]
    pub base: BillBase,
    pub real_property_value: PropertyId,
    /// Share of the year the property was in business use.
    #[round(dp = 2)]
    pub period_usage_pct: Decimal,
}

impl DepreciationBillData {
    pub fn tax_year(&self) -> i32 {
        self.base.start_date.year()
    }
}

fn is_jan_1(date: chrono::NaiveDate) -> bool {
    date.month() == 1 && date.day() == 1
}

fn is_dec_31(date: chrono::NaiveDate) -> bool {
    date.month() == 12 && date.day() == 31
}

impl BillRecord for DepreciationBillData {
    const KIND: BillKind = BillKind::Depreciation;

    fn base(&self) -> &BillBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BillBase {
        &mut self.base
    }

    fn valid_providers() -> &'static [Provider] {
        &[Provider::Depreciation]
    }

    fn tax_related_cost_default(&self, _real_estate: &RealEstate) -> Decimal {
        self.base.total_cost
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        let base = &self.base;
        if !is_jan_1(base.start_date) {
            return Err(ValidationError::DepreciationStart(base.start_date));
        }
        if !is_dec_31(base.end_date) || base.end_date.year() != base.start_date.year() {
            return Err(ValidationError::DepreciationEnd(base.end_date));
        }
        if let Some(paid) = base.paid_date {
            if !is_dec_31(paid) {
                return Err(ValidationError::DepreciationPaid(paid));
            }
        }
        if self.period_usage_pct < Decimal::ZERO || self.period_usage_pct > dec!(100) {
            return Err(ValidationError::UsagePct(self.period_usage_pct));
        }
        ensure_non_negative("total_cost", base.total_cost)
    }

    fn scale(&mut self, ratio: Decimal) {
        scale_money(&mut self.base.total_cost, ratio);
    }

    fn into_bill(self) -> Bill {
        Bill::Depreciation(self)
    }
}
