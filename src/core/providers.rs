use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Companies (and the internal depreciation pseudo-provider) that issue bills.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Provider {
    Pseg,
    NjNaturalGas,
    WellsFargo,
    Chase,
    NjAmericanWater,
    Verizon,
    StateFarm,
    TownshipTax,
    Contractor,
    SunRun,
    Depreciation,
}

/// Schedule E style expense category a provider's bills are reported under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum TaxCategory {
    Utilities,
    MortgageInterest,
    Insurance,
    PropertyTax,
    Repairs,
    Depreciation,
    Other,
}

impl Provider {
    pub const ALL: [Provider; 11] = [
        Provider::Pseg,
        Provider::NjNaturalGas,
        Provider::WellsFargo,
        Provider::Chase,
        Provider::NjAmericanWater,
        Provider::Verizon,
        Provider::StateFarm,
        Provider::TownshipTax,
        Provider::Contractor,
        Provider::SunRun,
        Provider::Depreciation,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Pseg => "PSE&G",
            Provider::NjNaturalGas => "New Jersey Natural Gas",
            Provider::WellsFargo => "Wells Fargo Home Mortgage",
            Provider::Chase => "Chase Home Lending",
            Provider::NjAmericanWater => "New Jersey American Water",
            Provider::Verizon => "Verizon",
            Provider::StateFarm => "State Farm",
            Provider::TownshipTax => "Township Tax Collector",
            Provider::Contractor => "Contractor",
            Provider::SunRun => "Sunrun",
            Provider::Depreciation => "Depreciation",
        }
    }

    /// Category used when a provider row is first created.
    pub fn default_tax_category(self) -> TaxCategory {
        match self {
            Provider::Pseg
            | Provider::NjNaturalGas
            | Provider::NjAmericanWater
            | Provider::Verizon
            | Provider::SunRun => TaxCategory::Utilities,
            Provider::WellsFargo | Provider::Chase => TaxCategory::MortgageInterest,
            Provider::StateFarm => TaxCategory::Insurance,
            Provider::TownshipTax => TaxCategory::PropertyTax,
            Provider::Contractor => TaxCategory::Repairs,
            Provider::Depreciation => TaxCategory::Depreciation,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Provider::ALL
            .into_iter()
            .find(|p| {
                p.to_string().eq_ignore_ascii_case(s) || p.display_name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| format!("unknown provider: {s}"))
    }
}

impl fmt::Display for TaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
