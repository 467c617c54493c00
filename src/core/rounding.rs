use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places of money fields.
pub const MONEY_DP: u32 = 2;
/// Decimal places of per-unit rates and percentages stored as fractions.
pub const RATE_DP: u32 = 6;
/// Decimal places of share quantities.
pub const QUANTITY_DP: u32 = 6;
/// Decimal places of per-share prices.
pub const PRICE_DP: u32 = 4;

/// Rounds every decimal field of a record to the precision declared for it.
/// Usually derived with `#[derive(RoundFields)]`.
pub trait RoundFields {
    fn round_fields(&mut self);

    fn rounded(mut self) -> Self
    where
        Self: Sized,
    {
        self.round_fields();
        self
    }
}

/// Round half away from zero, matching how statements round. The result
/// always carries `dp` decimal places, so `45.1` becomes `45.10`.
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

pub fn round_money(value: Decimal) -> Decimal {
    round_dp(value, MONEY_DP)
}
