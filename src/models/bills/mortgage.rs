use super::{ensure_sum, scale_money, Bill, BillBase, BillKind, BillRecord};
use crate::core::{Provider, RoundFields};
use crate::models::{RealEstate, ValidationError};
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct MortgageBillData {
    #[round(nested)]
    pub base: BillBase,
    #[round(dp = 2)]
    pub principal_payment: Decimal,
    #[round(dp = 2)]
    pub interest_payment: Decimal,
    #[round(dp = 2)]
    pub escrow_payment: Decimal,
    #[round(dp = 2)]
    pub fees: Decimal,
    /// Balance after this payment.
    #[round(dp = 2)]
    pub outstanding_principal: Decimal,
    #[round(dp = 6)]
    pub interest_rate: Decimal,
}

impl BillRecord for MortgageBillData {
    const KIND: BillKind = BillKind::Mortgage;

    fn base(&self) -> &BillBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BillBase {
        &mut self.base
    }

    fn valid_providers() -> &'static [Provider] {
        &[Provider::WellsFargo, Provider::Chase]
    }

    /// Only the interest part of a mortgage payment is deductible.
    fn tax_related_cost_default(&self, real_estate: &RealEstate) -> Decimal {
        if real_estate.bill_tax_related {
            self.interest_payment
        } else {
            Decimal::ZERO
        }
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        ensure_sum(Self::KIND, "total_cost", self.base.total_cost, &[
            self.principal_payment,
            self.interest_payment,
            self.escrow_payment,
            self.fees,
        ])
    }

    fn scale(&mut self, ratio: Decimal) {
        for cost in [
            &mut self.principal_payment,
            &mut self.interest_payment,
            &mut self.escrow_payment,
            &mut self.fees,
            &mut self.outstanding_principal,
        ] {
            scale_money(cost, ratio);
        }
        self.base.total_cost =
            self.principal_payment + self.interest_payment + self.escrow_payment + self.fees;
    }

    fn into_bill(self) -> Bill {
        Bill::Mortgage(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bills::tests::{base, real_estate};
    use rust_decimal_macros::dec;

    fn sample() -> MortgageBillData {
        MortgageBillData {
            base: base(Provider::WellsFargo, dec!(2890.44)),
            principal_payment: dec!(812.30),
            interest_payment: dec!(1402.14),
            escrow_payment: dec!(676.00),
            fees: dec!(0),
            outstanding_principal: dec!(253980.11),
            interest_rate: dec!(0.06625),
        }
    }

    #[test]
    fn default_is_interest_when_tax_related() {
        let bill = sample();
        assert_eq!(bill.tax_related_cost_default(&real_estate(true)), dec!(1402.14));
        assert_eq!(bill.tax_related_cost_default(&real_estate(false)), dec!(0));
    }

    #[test]
    fn payments_must_sum_to_total() {
        assert_eq!(sample().validate(), Ok(()));
        let mut bill = sample();
        bill.fees = dec!(15);
        assert!(bill.validate().is_err());
    }
}
