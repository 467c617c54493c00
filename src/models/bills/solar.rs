use super::{ensure_sum, Bill, BillBase, BillKind, BillRecord};
use crate::core::{round_dp, round_money, Provider, RoundFields};
use crate::models::ValidationError;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Solar power purchase agreement bill: production billed at the PPA rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct SolarBillData {
    #[round(nested)]
    pub base: BillBase,
    #[round(dp = 0)]
    pub production_kwh: Decimal,
    #[round(dp = 0)]
    pub export_kwh: Decimal,
    #[round(dp = 6)]
    pub ppa_rate: Decimal,
}

impl SolarBillData {
    pub fn expected_total(&self) -> Decimal {
        round_money(self.production_kwh * self.ppa_rate)
    }
}

impl BillRecord for SolarBillData {
    const KIND: BillKind = BillKind::Solar;

    fn base(&self) -> &BillBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BillBase {
        &mut self.base
    }

    fn valid_providers() -> &'static [Provider] {
        &[Provider::SunRun]
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        ensure_sum(Self::KIND, "total_cost", self.base.total_cost, &[
            self.expected_total()
        ])
    }

    fn scale(&mut self, ratio: Decimal) {
        self.production_kwh = round_dp(self.production_kwh * ratio, 0);
        self.export_kwh = round_dp(self.export_kwh * ratio, 0);
        self.base.total_cost = self.expected_total();
    }

    fn into_bill(self) -> Bill {
        Bill::Solar(self)
    }
}
