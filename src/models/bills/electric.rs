use super::{ensure_sum, scale_money, Bill, BillBase, BillKind, BillRecord};
use crate::core::{round_dp, Provider, RoundFields};
use crate::models::ValidationError;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Electric bill with the delivery and supply charge waterfalls.
///
/// Delivery: service charge, distribution tiers on non-heat kWh and heat kWh
/// make up `distribution_subtotal`; SBC, ZEC and green programs charges are per
/// kWh; the tax adjustment credit is a fraction of the distribution subtotal;
/// sales tax applies to everything before it. Supply: tiers on total kWh plus
/// transmission, then sales tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct ElectricBillData {
    #[round(nested)]
    pub base: BillBase,
    /// False for estimates derived from an actual bill.
    pub is_actual: bool,
    #[round(dp = 0)]
    pub total_kwh: Decimal,
    /// Electric heat kWh, billed at `eh_rate`.
    #[round(dp = 0)]
    pub eh_kwh: Decimal,

    #[round(dp = 2)]
    pub service_charge: Decimal,
    #[round(dp = 0)]
    pub dist_first_kwh: Decimal,
    #[round(dp = 6)]
    pub dist_first_rate: Decimal,
    #[round(dp = 2)]
    pub dist_first_cost: Decimal,
    #[round(dp = 0)]
    pub dist_next_kwh: Decimal,
    #[round(dp = 6)]
    pub dist_next_rate: Decimal,
    #[round(dp = 2)]
    pub dist_next_cost: Decimal,
    #[round(dp = 6)]
    pub eh_rate: Decimal,
    #[round(dp = 2)]
    pub eh_cost: Decimal,
    #[round(dp = 2)]
    pub distribution_subtotal: Decimal,
    #[round(dp = 6)]
    pub sbc_rate: Decimal,
    #[round(dp = 2)]
    pub sbc_cost: Decimal,
    #[round(dp = 6)]
    pub zec_rate: Decimal,
    #[round(dp = 2)]
    pub zec_cost: Decimal,
    #[round(dp = 6)]
    pub gpc_rate: Decimal,
    #[round(dp = 2)]
    pub gpc_cost: Decimal,
    #[round(dp = 6)]
    pub tac_pct: Decimal,
    #[round(dp = 2)]
    pub tac_cost: Decimal,
    #[round(dp = 6)]
    pub sales_tax_rate: Decimal,
    #[round(dp = 2)]
    pub delivery_tax: Decimal,
    #[round(dp = 2)]
    pub delivery_cost: Decimal,

    #[round(dp = 0)]
    pub supply_first_kwh: Decimal,
    #[round(dp = 6)]
    pub supply_first_rate: Decimal,
    #[round(dp = 2)]
    pub supply_first_cost: Decimal,
    #[round(dp = 0)]
    pub supply_next_kwh: Decimal,
    #[round(dp = 6)]
    pub supply_next_rate: Decimal,
    #[round(dp = 2)]
    pub supply_next_cost: Decimal,
    #[round(dp = 6)]
    pub transmission_rate: Decimal,
    #[round(dp = 2)]
    pub transmission_cost: Decimal,
    #[round(dp = 2)]
    pub supply_tax: Decimal,
    #[round(dp = 2)]
    pub supply_cost: Decimal,

    #[round(dp = 2)]
    pub other_cost: Decimal,
}

impl ElectricBillData {
    fn distribution_parts(&self) -> [Decimal; 4] {
        [
            self.service_charge,
            self.dist_first_cost,
            self.dist_next_cost,
            self.eh_cost,
        ]
    }

    fn delivery_parts(&self) -> [Decimal; 6] {
        [
            self.distribution_subtotal,
            self.sbc_cost,
            self.zec_cost,
            self.gpc_cost,
            self.tac_cost,
            self.delivery_tax,
        ]
    }

    fn supply_parts(&self) -> [Decimal; 4] {
        [
            self.supply_first_cost,
            self.supply_next_cost,
            self.transmission_cost,
            self.supply_tax,
        ]
    }

    /// Recompute section subtotals and the total from the line items.
    pub fn resum(&mut self) {
        self.distribution_subtotal = self.distribution_parts().iter().sum();
        self.delivery_cost = self.delivery_parts().iter().sum();
        self.supply_cost = self.supply_parts().iter().sum();
        self.base.total_cost = self.delivery_cost + self.supply_cost + self.other_cost;
    }
}

impl BillRecord for ElectricBillData {
    const KIND: BillKind = BillKind::Electric;

    fn base(&self) -> &BillBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BillBase {
        &mut self.base
    }

    fn valid_providers() -> &'static [Provider] {
        &[Provider::Pseg]
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        let kind = Self::KIND;
        ensure_sum(kind, "total_kwh", self.total_kwh, &[
            self.dist_first_kwh,
            self.dist_next_kwh,
            self.eh_kwh,
        ])?;
        ensure_sum(
            kind,
            "distribution_subtotal",
            self.distribution_subtotal,
            &self.distribution_parts(),
        )?;
        ensure_sum(kind, "delivery_cost", self.delivery_cost, &self.delivery_parts())?;
        ensure_sum(kind, "supply_cost", self.supply_cost, &self.supply_parts())?;
        ensure_sum(kind, "total_cost", self.base.total_cost, &[
            self.delivery_cost,
            self.supply_cost,
            self.other_cost,
        ])
    }

    fn scale(&mut self, ratio: Decimal) {
        for kwh in [
            &mut self.total_kwh,
            &mut self.eh_kwh,
            &mut self.dist_first_kwh,
            &mut self.dist_next_kwh,
            &mut self.supply_first_kwh,
            &mut self.supply_next_kwh,
        ] {
            *kwh = round_dp(*kwh * ratio, 0);
        }
        // Keep the usage split consistent after rounding.
        self.dist_next_kwh = self.total_kwh - self.eh_kwh - self.dist_first_kwh;
        self.supply_next_kwh = self.total_kwh - self.supply_first_kwh;
        for cost in [
            &mut self.service_charge,
            &mut self.dist_first_cost,
            &mut self.dist_next_cost,
            &mut self.eh_cost,
            &mut self.sbc_cost,
            &mut self.zec_cost,
            &mut self.gpc_cost,
            &mut self.tac_cost,
            &mut self.delivery_tax,
            &mut self.supply_first_cost,
            &mut self.supply_next_cost,
            &mut self.transmission_cost,
            &mut self.supply_tax,
            &mut self.other_cost,
        ] {
            scale_money(cost, ratio);
        }
        self.resum();
    }

    fn into_bill(self) -> Bill {
        Bill::Electric(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::bills::tests::base;
    use rust_decimal_macros::dec;

    /// A consistent actual bill for 546 kWh.
    pub(crate) fn sample() -> ElectricBillData {
        let mut bill = ElectricBillData {
            base: base(Provider::Pseg, Decimal::ZERO),
            is_actual: true,
            total_kwh: dec!(546),
            eh_kwh: dec!(0),
            service_charge: dec!(6.96),
            dist_first_kwh: dec!(546),
            dist_first_rate: dec!(0.069711),
            dist_first_cost: dec!(38.06),
            dist_next_kwh: dec!(0),
            dist_next_rate: dec!(0.077381),
            dist_next_cost: dec!(0),
            eh_rate: dec!(0.061500),
            eh_cost: dec!(0),
            distribution_subtotal: Decimal::ZERO,
            sbc_rate: dec!(0.008913),
            sbc_cost: dec!(4.87),
            zec_rate: dec!(0.004000),
            zec_cost: dec!(2.18),
            gpc_rate: dec!(0.001380),
            gpc_cost: dec!(0.75),
            tac_pct: dec!(-0.010000),
            tac_cost: dec!(-0.45),
            sales_tax_rate: dec!(0.06625),
            delivery_tax: dec!(3.47),
            delivery_cost: Decimal::ZERO,
            supply_first_kwh: dec!(546),
            supply_first_rate: dec!(0.101340),
            supply_first_cost: dec!(55.33),
            supply_next_kwh: dec!(0),
            supply_next_rate: dec!(0.110220),
            supply_next_cost: dec!(0),
            transmission_rate: dec!(0.022000),
            transmission_cost: dec!(12.01),
            supply_tax: dec!(4.46),
            supply_cost: Decimal::ZERO,
            other_cost: dec!(0),
        };
        bill.resum();
        bill
    }

    #[test]
    fn resum_makes_the_bill_consistent() {
        let bill = sample();
        assert_eq!(bill.distribution_subtotal, dec!(45.02));
        assert_eq!(bill.delivery_cost, dec!(55.84));
        assert_eq!(bill.supply_cost, dec!(71.80));
        assert_eq!(bill.base.total_cost, dec!(127.64));
        assert_eq!(bill.validate(), Ok(()));
    }

    #[test]
    fn sum_mismatch_is_rejected() {
        let mut bill = sample();
        bill.base.total_cost += dec!(0.01);
        assert!(matches!(
            bill.validate(),
            Err(ValidationError::BillSumMismatch {
                field: "total_cost",
                ..
            })
        ));
    }

    #[test]
    fn scale_keeps_invariants() {
        let mut bill = sample();
        bill.scale(dec!(0.5));
        assert_eq!(bill.total_kwh, dec!(273));
        assert_eq!(bill.validate(), Ok(()));
    }
}
