pub mod account;
pub mod bills;
pub mod news;
pub mod position;
pub mod real_estate;
pub mod security;
pub mod transaction;
pub mod utility_data;

use crate::core::{ActionType, AssetClass, AssetSubclass, Provider, SentimentLabel, TransactionType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use account::InvestmentAccount;
pub use bills::{
    Bill, BillBase, BillKind, BillOverrides, BillRecord, DepreciationBillData, ElectricBillData,
    MortgageBillData, NatGasBillData, SimpleBillData, SolarBillData, TaxRelatedCost,
};
pub use news::NewsSentiment;
pub use position::{ClosedPosition, Position};
pub use real_estate::{RealEstate, RealPropertyValue, ServiceProvider};
pub use security::Security;
pub use transaction::{TickerHistory, Transaction};
pub use utility_data::{ElectricData, NatGasData, UtilityData, YearMonth};

/// Cross-field invariant violations. Raised by `validate()` and again by the
/// store before a record is written.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("asset subclass {subclass} does not belong to asset class {class}")]
    SubclassMismatch {
        class: AssetClass,
        subclass: AssetSubclass,
    },
    #[error("identifier {identifier} does not carry the {class} prefix")]
    IdentifierPrefix {
        identifier: String,
        class: AssetClass,
    },
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),
    #[error("action {action} belongs to {expected}, not {declared}")]
    ActionTypeMismatch {
        action: ActionType,
        expected: TransactionType,
        declared: TransactionType,
    },
    #[error("{0} transactions require a security")]
    SecurityRequired(TransactionType),
    #[error("{0} transactions must not reference a security")]
    SecurityForbidden(TransactionType),
    #[error(
        "non taxable account {account_id} must have short term pnl fields set to 0; \
         pnl for non taxable accounts must be entered in long term pnl fields"
    )]
    NonTaxableShortTerm { account_id: String },
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),
    #[error("{what}: {start} is after {end}")]
    DateOrder {
        what: &'static str,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("depreciation bill must start on Jan 1, got {0}")]
    DepreciationStart(NaiveDate),
    #[error("depreciation bill must end on Dec 31 of its start year, got {0}")]
    DepreciationEnd(NaiveDate),
    #[error("depreciation bill must be paid on Dec 31, got {0}")]
    DepreciationPaid(NaiveDate),
    #[error("period usage must be between 0 and 100 percent, got {0}")]
    UsagePct(Decimal),
    #[error("{provider} is not a valid provider for {kind} bills")]
    InvalidProvider { provider: Provider, kind: BillKind },
    #[error("{kind} bill {field} is {actual} but its parts sum to {expected}")]
    BillSumMismatch {
        kind: BillKind,
        field: &'static str,
        expected: Decimal,
        actual: Decimal,
    },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: Decimal },
    #[error("sentiment score {score} is outside the range of label {label}")]
    SentimentScore { label: SentimentLabel, score: Decimal },
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Row id of an [`InvestmentAccount`].
    AccountId
);
id_type!(
    /// Row id of a [`Security`].
    SecurityId
);
id_type!(
    /// Row id of a [`RealPropertyValue`].
    PropertyId
);
id_type!(
    /// Row id of a stored [`Bill`].
    BillId
);

pub(crate) fn ensure_date_order(
    what: &'static str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::DateOrder { what, start, end });
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}
