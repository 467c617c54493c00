use super::{ensure_date_order, AccountId, InvestmentAccount, SecurityId, ValidationError};
use crate::core::RoundFields;
use chrono::NaiveDate;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open lot holding as of a statement date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct Position {
    pub account: AccountId,
    pub security: SecurityId,
    pub as_of_date: NaiveDate,
    #[round(dp = 6)]
    pub quantity: Decimal,
    #[round(dp = 4)]
    pub price: Decimal,
    #[round(dp = 2)]
    pub market_value: Decimal,
    #[round(dp = 2)]
    pub cost_basis_total: Option<Decimal>,
}

impl Position {
    pub fn unrealized_pnl(&self) -> Option<Decimal> {
        self.cost_basis_total.map(|cost| self.market_value - cost)
    }
}

/// A sold lot. Adjusted fields include the wash sale adjustment, `_unadj`
/// fields are the values before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct ClosedPosition {
    pub account: AccountId,
    pub security: SecurityId,
    #[round(dp = 6)]
    pub quantity: Decimal,
    pub date_acquired: NaiveDate,
    pub date_sold: NaiveDate,
    #[round(dp = 4)]
    pub proceeds_price: Decimal,
    #[round(dp = 2)]
    pub proceeds_total: Decimal,
    #[round(dp = 4)]
    pub cost_basis_price: Decimal,
    #[round(dp = 2)]
    pub cost_basis_total: Decimal,
    #[round(dp = 2)]
    pub short_term_pnl: Decimal,
    #[round(dp = 2)]
    pub long_term_pnl: Decimal,
    #[round(dp = 2)]
    pub proceeds_total_unadj: Decimal,
    #[round(dp = 2)]
    pub cost_basis_total_unadj: Decimal,
    #[round(dp = 2)]
    pub short_term_pnl_unadj: Decimal,
    #[round(dp = 2)]
    pub long_term_pnl_unadj: Decimal,
    #[round(dp = 2)]
    pub wash_sale_disallowed: Decimal,
    pub source_file: String,
}

impl ClosedPosition {
    pub fn validate(&self, account: &InvestmentAccount) -> Result<(), ValidationError> {
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        ensure_date_order("closed position dates", self.date_acquired, self.date_sold)?;
        if !account.taxable
            && (!self.short_term_pnl.is_zero() || !self.short_term_pnl_unadj.is_zero())
        {
            return Err(ValidationError::NonTaxableShortTerm {
                account_id: account.account_id.clone(),
            });
        }
        Ok(())
    }

    pub fn total_pnl(&self) -> Decimal {
        self.short_term_pnl + self.long_term_pnl
    }

    pub fn total_pnl_unadj(&self) -> Decimal {
        self.short_term_pnl_unadj + self.long_term_pnl_unadj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(taxable: bool) -> InvestmentAccount {
        InvestmentAccount {
            broker: "Fidelity".to_string(),
            account_id: "Z12345678".to_string(),
            account_name: "Individual".to_string(),
            taxable,
            create_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    fn closed(short_term: Decimal, short_term_unadj: Decimal) -> ClosedPosition {
        ClosedPosition {
            account: AccountId(1),
            security: SecurityId(1),
            quantity: dec!(2),
            date_acquired: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            date_sold: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
            proceeds_price: dec!(335.60),
            proceeds_total: dec!(671.20),
            cost_basis_price: dec!(350),
            cost_basis_total: dec!(700),
            short_term_pnl: short_term,
            long_term_pnl: dec!(0),
            proceeds_total_unadj: dec!(671.20),
            cost_basis_total_unadj: dec!(700),
            short_term_pnl_unadj: short_term_unadj,
            long_term_pnl_unadj: dec!(0),
            wash_sale_disallowed: dec!(0),
            source_file: "closed.csv".to_string(),
        }
    }

    #[test]
    fn non_taxable_account_rejects_short_term_pnl() {
        let account = account(false);
        assert!(matches!(
            closed(dec!(-28.80), dec!(0)).validate(&account),
            Err(ValidationError::NonTaxableShortTerm { .. })
        ));
        assert!(matches!(
            closed(dec!(0), dec!(-28.80)).validate(&account),
            Err(ValidationError::NonTaxableShortTerm { .. })
        ));
        assert_eq!(closed(dec!(0), dec!(0)).validate(&account), Ok(()));
    }

    #[test]
    fn taxable_account_allows_short_term_pnl() {
        assert_eq!(
            closed(dec!(-28.80), dec!(-28.80)).validate(&account(true)),
            Ok(())
        );
    }

    #[test]
    fn quantity_must_be_positive() {
        let mut position = closed(dec!(0), dec!(0));
        position.quantity = dec!(0);
        assert_eq!(
            position.validate(&account(true)),
            Err(ValidationError::NonPositiveQuantity(dec!(0)))
        );
    }
}
