use super::{AccountId, SecurityId, ValidationError};
use crate::core::{ActionType, RoundFields, TransactionType};
use chrono::NaiveDate;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One brokerage ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct Transaction {
    pub account: AccountId,
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub action_type: ActionType,
    pub description: String,
    pub security: Option<SecurityId>,
    #[round(dp = 6)]
    pub quantity: Option<Decimal>,
    #[round(dp = 4)]
    pub price: Option<Decimal>,
    #[round(dp = 2)]
    pub net_amount: Decimal,
    #[round(dp = 2)]
    pub commission: Option<Decimal>,
    #[round(dp = 2)]
    pub fees: Option<Decimal>,
    pub source_file: String,
}

impl Transaction {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let expected = self.action_type.transaction_type();
        if expected != self.transaction_type {
            return Err(ValidationError::ActionTypeMismatch {
                action: self.action_type,
                expected,
                declared: self.transaction_type,
            });
        }
        let has_security = self.security.is_some();
        if !self
            .transaction_type
            .security_requirement()
            .allows(has_security)
        {
            return Err(if has_security {
                ValidationError::SecurityForbidden(self.transaction_type)
            } else {
                ValidationError::SecurityRequired(self.transaction_type)
            });
        }
        Ok(())
    }
}

/// Ticker rename recorded by a merger. Unique on `(old_ticker, new_ticker)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerHistory {
    pub old_ticker: String,
    pub new_ticker: String,
    pub date: NaiveDate,
}
