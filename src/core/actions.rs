use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger category of a brokerage transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum TransactionType {
    Trade,
    Dividend,
    Interest,
    CorporateAction,
    Transfer,
    Fee,
    Other,
}

/// Whether a transaction of a given type must, may or must not reference a
/// security.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityRequirement {
    Required,
    Optional,
    Forbidden,
}

impl SecurityRequirement {
    pub fn allows(self, has_security: bool) -> bool {
        match self {
            SecurityRequirement::Required => has_security,
            SecurityRequirement::Optional => true,
            SecurityRequirement::Forbidden => !has_security,
        }
    }
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        TransactionType::Trade,
        TransactionType::Dividend,
        TransactionType::Interest,
        TransactionType::CorporateAction,
        TransactionType::Transfer,
        TransactionType::Fee,
        TransactionType::Other,
    ];

    pub fn security_requirement(self) -> SecurityRequirement {
        match self {
            TransactionType::Trade
            | TransactionType::Dividend
            | TransactionType::Interest
            | TransactionType::CorporateAction
            | TransactionType::Other => SecurityRequirement::Required,
            TransactionType::Fee => SecurityRequirement::Optional,
            TransactionType::Transfer => SecurityRequirement::Forbidden,
        }
    }

    pub fn action_types(self) -> impl Iterator<Item = ActionType> {
        ActionType::ALL
            .into_iter()
            .filter(move |a| a.transaction_type() == self)
    }

    /// Income generating transaction types, used by the income report.
    pub fn is_income(self) -> bool {
        matches!(self, TransactionType::Dividend | TransactionType::Interest)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Specific brokerage action. Every action belongs to exactly one
/// [`TransactionType`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum ActionType {
    Buy,
    Sell,
    Reinvest,
    DividendReceived,
    LongTermCapGain,
    ShortTermCapGain,
    ReturnOfCapital,
    InterestEarned,
    MergerNew,
    MergerOld,
    Split,
    ReverseSplit,
    SpinOff,
    Redemption,
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
    Contribution,
    Journal,
    FeeCharged,
    ForeignTaxPaid,
    CashInLieu,
}

impl ActionType {
    pub const ALL: [ActionType; 23] = [
        ActionType::Buy,
        ActionType::Sell,
        ActionType::Reinvest,
        ActionType::DividendReceived,
        ActionType::LongTermCapGain,
        ActionType::ShortTermCapGain,
        ActionType::ReturnOfCapital,
        ActionType::InterestEarned,
        ActionType::MergerNew,
        ActionType::MergerOld,
        ActionType::Split,
        ActionType::ReverseSplit,
        ActionType::SpinOff,
        ActionType::Redemption,
        ActionType::Deposit,
        ActionType::Withdrawal,
        ActionType::TransferIn,
        ActionType::TransferOut,
        ActionType::Contribution,
        ActionType::Journal,
        ActionType::FeeCharged,
        ActionType::ForeignTaxPaid,
        ActionType::CashInLieu,
    ];

    /// The transaction type this action belongs to.
    pub fn transaction_type(self) -> TransactionType {
        use ActionType::*;
        match self {
            Buy | Sell | Reinvest => TransactionType::Trade,
            DividendReceived | LongTermCapGain | ShortTermCapGain | ReturnOfCapital => {
                TransactionType::Dividend
            }
            InterestEarned => TransactionType::Interest,
            MergerNew | MergerOld | Split | ReverseSplit | SpinOff | Redemption => {
                TransactionType::CorporateAction
            }
            Deposit | Withdrawal | TransferIn | TransferOut | Contribution | Journal => {
                TransactionType::Transfer
            }
            FeeCharged => TransactionType::Fee,
            ForeignTaxPaid | CashInLieu => TransactionType::Other,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
