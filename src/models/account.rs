use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A brokerage account. Unique on `(broker, account_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentAccount {
    pub broker: String,
    pub account_id: String,
    pub account_name: String,
    /// Retirement accounts are not taxable; their pnl is recorded as long term.
    pub taxable: bool,
    pub create_date: NaiveDate,
}
