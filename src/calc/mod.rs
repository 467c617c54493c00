//! Financial calculators: depreciation schedules and utility bill estimates.

pub mod depreciation;
pub mod estimator;

use crate::core::Address;
use crate::models::{BillId, BillKind, ValidationError, YearMonth};
use crate::store::StoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("depreciation for {tax_year} is not final until the year has ended (today is in {current_year})")]
    TaxYearNotPast { tax_year: i32, current_year: i32 },
    #[error("billing period {start} to {end} has no length")]
    ZeroLengthPeriod { start: NaiveDate, end: NaiveDate },
    #[error("no {kind} rates for {real_estate} {month}")]
    MissingRates {
        kind: BillKind,
        real_estate: Address,
        month: YearMonth,
    },
    #[error("tax year out of range: {0}")]
    InvalidTaxYear(i32),
    #[error("estimated usage is negative: {0}")]
    NegativeUsage(Decimal),
    #[error("bill not found: {0}")]
    BillNotFound(BillId),
    #[error("bill {id} is a {actual} bill, expected {expected}")]
    WrongBillKind {
        id: BillId,
        expected: BillKind,
        actual: BillKind,
    },
    #[error("bill {0} is already an estimate")]
    NotActual(BillId),
    #[error("real estate not found: {0}")]
    RealEstateNotFound(Address),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
