use super::{ensure_sum, scale_money, Bill, BillBase, BillKind, BillRecord};
use crate::core::{round_dp, Provider, RoundFields};
use crate::models::ValidationError;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Natural gas bill. Delivery is a service charge plus three usage tiers
/// (`distribution_subtotal`), balancing and SBC per therm, the CIP charge as a
/// fraction of the distribution subtotal, then sales tax. Supply is BGSS per
/// therm plus sales tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct NatGasBillData {
    #[round(nested)]
    pub base: BillBase,
    pub is_actual: bool,
    #[round(dp = 1)]
    pub total_therms: Decimal,

    #[round(dp = 2)]
    pub service_charge: Decimal,
    #[round(dp = 1)]
    pub basic_therms: Decimal,
    #[round(dp = 6)]
    pub basic_rate: Decimal,
    #[round(dp = 2)]
    pub basic_cost: Decimal,
    #[round(dp = 1)]
    pub next_therms: Decimal,
    #[round(dp = 6)]
    pub next_rate: Decimal,
    #[round(dp = 2)]
    pub next_cost: Decimal,
    #[round(dp = 1)]
    pub over_therms: Decimal,
    #[round(dp = 6)]
    pub over_rate: Decimal,
    #[round(dp = 2)]
    pub over_cost: Decimal,
    #[round(dp = 2)]
    pub distribution_subtotal: Decimal,
    #[round(dp = 6)]
    pub balancing_rate: Decimal,
    #[round(dp = 2)]
    pub balancing_cost: Decimal,
    #[round(dp = 6)]
    pub sbc_rate: Decimal,
    #[round(dp = 2)]
    pub sbc_cost: Decimal,
    #[round(dp = 6)]
    pub cip_pct: Decimal,
    #[round(dp = 2)]
    pub cip_cost: Decimal,
    /// Not every gas bill prints its sales tax rate.
    #[round(dp = 6)]
    pub sales_tax_rate: Option<Decimal>,
    #[round(dp = 2)]
    pub delivery_tax: Decimal,
    #[round(dp = 2)]
    pub delivery_cost: Decimal,

    #[round(dp = 6)]
    pub bgss_rate: Decimal,
    #[round(dp = 2)]
    pub bgss_cost: Decimal,
    #[round(dp = 2)]
    pub supply_tax: Decimal,
    #[round(dp = 2)]
    pub supply_cost: Decimal,

    #[round(dp = 2)]
    pub other_cost: Decimal,
}

impl NatGasBillData {
    fn distribution_parts(&self) -> [Decimal; 4] {
        [
            self.service_charge,
            self.basic_cost,
            self.next_cost,
            self.over_cost,
        ]
    }

    fn delivery_parts(&self) -> [Decimal; 5] {
        [
            self.distribution_subtotal,
            self.balancing_cost,
            self.sbc_cost,
            self.cip_cost,
            self.delivery_tax,
        ]
    }

    pub fn resum(&mut self) {
        self.distribution_subtotal = self.distribution_parts().iter().sum();
        self.delivery_cost = self.delivery_parts().iter().sum();
        self.supply_cost = self.bgss_cost + self.supply_tax;
        self.base.total_cost = self.delivery_cost + self.supply_cost + self.other_cost;
    }
}

impl BillRecord for NatGasBillData {
    const KIND: BillKind = BillKind::NatGas;

    fn base(&self) -> &BillBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BillBase {
        &mut self.base
    }

    fn valid_providers() -> &'static [Provider] {
        &[Provider::Pseg, Provider::NjNaturalGas]
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        let kind = Self::KIND;
        ensure_sum(kind, "total_therms", self.total_therms, &[
            self.basic_therms,
            self.next_therms,
            self.over_therms,
        ])?;
        ensure_sum(
            kind,
            "distribution_subtotal",
            self.distribution_subtotal,
            &self.distribution_parts(),
        )?;
        ensure_sum(kind, "delivery_cost", self.delivery_cost, &self.delivery_parts())?;
        ensure_sum(kind, "supply_cost", self.supply_cost, &[
            self.bgss_cost,
            self.supply_tax,
        ])?;
        ensure_sum(kind, "total_cost", self.base.total_cost, &[
            self.delivery_cost,
            self.supply_cost,
            self.other_cost,
        ])
    }

    fn scale(&mut self, ratio: Decimal) {
        for therms in [
            &mut self.total_therms,
            &mut self.basic_therms,
            &mut self.next_therms,
        ] {
            *therms = round_dp(*therms * ratio, 1);
        }
        self.over_therms = self.total_therms - self.basic_therms - self.next_therms;
        for cost in [
            &mut self.service_charge,
            &mut self.basic_cost,
            &mut self.next_cost,
            &mut self.over_cost,
            &mut self.balancing_cost,
            &mut self.sbc_cost,
            &mut self.cip_cost,
            &mut self.delivery_tax,
            &mut self.bgss_cost,
            &mut self.supply_tax,
            &mut self.other_cost,
        ] {
            scale_money(cost, ratio);
        }
        self.resum();
    }

    fn into_bill(self) -> Bill {
        Bill::NatGas(self)
    }
}
