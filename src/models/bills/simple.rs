use super::{scale_money, Bill, BillBase, BillKind, BillRecord};
use crate::core::{Provider, RoundFields};
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bill recorded by its total only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct SimpleBillData {
    #[round(nested)]
    pub base: BillBase,
}

impl BillRecord for SimpleBillData {
    const KIND: BillKind = BillKind::Simple;

    fn base(&self) -> &BillBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BillBase {
        &mut self.base
    }

    fn valid_providers() -> &'static [Provider] {
        &[
            Provider::Pseg,
            Provider::NjNaturalGas,
            Provider::NjAmericanWater,
            Provider::Verizon,
            Provider::StateFarm,
            Provider::TownshipTax,
            Provider::Contractor,
        ]
    }

    fn scale(&mut self, ratio: Decimal) {
        scale_money(&mut self.base.total_cost, ratio);
    }

    fn into_bill(self) -> Bill {
        Bill::Simple(self)
    }
}
