use crate::core::{Address, RoundFields};
use chrono::{Datelike, NaiveDate};
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(YearMonth { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("month is in 1..=12")
    }

    pub fn last_day(self) -> NaiveDate {
        self.next().first_day().pred_opt().expect("not the first representable date")
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            YearMonth {
                year: self.year - 1,
                month: 12,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {s}"))?;
        let year = year.parse().map_err(|_| format!("invalid year in {s}"))?;
        let month = month.parse().map_err(|_| format!("invalid month in {s}"))?;
        YearMonth::new(year, month).ok_or_else(|| format!("invalid month in {s}"))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Published electric tariff for one property and month.
///
/// Thresholds are kWh; rates are dollars per kWh; `tac_pct` is a fraction of
/// the distribution subtotal and is negative when it is a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct ElectricData {
    pub real_estate: Address,
    pub month: YearMonth,
    #[round(dp = 2)]
    pub service_charge: Decimal,
    /// Size of the first tier, for both distribution and supply.
    #[round(dp = 0)]
    pub first_kwh: Decimal,
    #[round(dp = 6)]
    pub dist_first_rate: Decimal,
    #[round(dp = 6)]
    pub dist_next_rate: Decimal,
    #[round(dp = 6)]
    pub eh_rate: Decimal,
    #[round(dp = 6)]
    pub sbc_rate: Decimal,
    #[round(dp = 6)]
    pub zec_rate: Decimal,
    #[round(dp = 6)]
    pub gpc_rate: Decimal,
    #[round(dp = 6)]
    pub tac_pct: Decimal,
    #[round(dp = 6)]
    pub supply_first_rate: Decimal,
    #[round(dp = 6)]
    pub supply_next_rate: Decimal,
    #[round(dp = 6)]
    pub transmission_rate: Decimal,
}

/// Published gas tariff for one property and month. Tier thresholds are
/// cumulative therms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct NatGasData {
    pub real_estate: Address,
    pub month: YearMonth,
    #[round(dp = 2)]
    pub service_charge: Decimal,
    #[round(dp = 1)]
    pub basic_therms: Decimal,
    #[round(dp = 1)]
    pub next_therms: Decimal,
    #[round(dp = 6)]
    pub basic_rate: Decimal,
    #[round(dp = 6)]
    pub next_rate: Decimal,
    #[round(dp = 6)]
    pub over_rate: Decimal,
    #[round(dp = 6)]
    pub balancing_rate: Decimal,
    #[round(dp = 6)]
    pub sbc_rate: Decimal,
    #[round(dp = 6)]
    pub cip_pct: Decimal,
    #[round(dp = 6)]
    pub bgss_rate: Decimal,
}

/// A monthly tariff snapshot, keyed by `(real_estate, month)`.
pub trait UtilityData: Clone {
    fn key(&self) -> (Address, YearMonth);

    /// Field-wise `start * (1 - w) + end * w`, unrounded. Key fields are
    /// taken from `end`.
    fn blend(start: &Self, end: &Self, w: Decimal) -> Self;
}

fn mix(start: Decimal, end: Decimal, w: Decimal) -> Decimal {
    start * (Decimal::ONE - w) + end * w
}

impl UtilityData for ElectricData {
    fn key(&self) -> (Address, YearMonth) {
        (self.real_estate, self.month)
    }

    fn blend(start: &Self, end: &Self, w: Decimal) -> Self {
        ElectricData {
            real_estate: end.real_estate,
            month: end.month,
            service_charge: mix(start.service_charge, end.service_charge, w),
            first_kwh: mix(start.first_kwh, end.first_kwh, w),
            dist_first_rate: mix(start.dist_first_rate, end.dist_first_rate, w),
            dist_next_rate: mix(start.dist_next_rate, end.dist_next_rate, w),
            eh_rate: mix(start.eh_rate, end.eh_rate, w),
            sbc_rate: mix(start.sbc_rate, end.sbc_rate, w),
            zec_rate: mix(start.zec_rate, end.zec_rate, w),
            gpc_rate: mix(start.gpc_rate, end.gpc_rate, w),
            tac_pct: mix(start.tac_pct, end.tac_pct, w),
            supply_first_rate: mix(start.supply_first_rate, end.supply_first_rate, w),
            supply_next_rate: mix(start.supply_next_rate, end.supply_next_rate, w),
            transmission_rate: mix(start.transmission_rate, end.transmission_rate, w),
        }
    }
}

impl UtilityData for NatGasData {
    fn key(&self) -> (Address, YearMonth) {
        (self.real_estate, self.month)
    }

    fn blend(start: &Self, end: &Self, w: Decimal) -> Self {
        NatGasData {
            real_estate: end.real_estate,
            month: end.month,
            service_charge: mix(start.service_charge, end.service_charge, w),
            basic_therms: mix(start.basic_therms, end.basic_therms, w),
            next_therms: mix(start.next_therms, end.next_therms, w),
            basic_rate: mix(start.basic_rate, end.basic_rate, w),
            next_rate: mix(start.next_rate, end.next_rate, w),
            over_rate: mix(start.over_rate, end.over_rate, w),
            balancing_rate: mix(start.balancing_rate, end.balancing_rate, w),
            sbc_rate: mix(start.sbc_rate, end.sbc_rate, w),
            cip_pct: mix(start.cip_pct, end.cip_pct, w),
            bgss_rate: mix(start.bgss_rate, end.bgss_rate, w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_parse_and_display() {
        let ym: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(ym, YearMonth::new(2024, 2).unwrap());
        assert_eq!(ym.to_string(), "2024-02");
        assert_eq!(ym.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!("2024-13".parse::<YearMonth>().is_err());
    }

    #[test]
    fn year_month_wraps_years() {
        let dec = YearMonth::new(2023, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2024, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);
    }
}
