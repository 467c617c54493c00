use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broad asset class of a security. Each class owns an identifier prefix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum AssetClass {
    Equity,
    FixedIncome,
    CashEquivalent,
    RealAsset,
    Alternative,
    /// Placeholder for securities auto-created by an import.
    NotSet,
}

impl AssetClass {
    pub const ALL: [AssetClass; 6] = [
        AssetClass::Equity,
        AssetClass::FixedIncome,
        AssetClass::CashEquivalent,
        AssetClass::RealAsset,
        AssetClass::Alternative,
        AssetClass::NotSet,
    ];

    /// Three character identifier prefix (two letters and an underscore).
    pub fn id_prefix(self) -> &'static str {
        match self {
            AssetClass::Equity => "EQ_",
            AssetClass::FixedIncome => "FI_",
            AssetClass::CashEquivalent => "CE_",
            AssetClass::RealAsset => "RA_",
            AssetClass::Alternative => "AL_",
            AssetClass::NotSet => "NS_",
        }
    }

    pub fn subclasses(self) -> &'static [AssetSubclass] {
        use AssetSubclass::*;
        match self {
            AssetClass::Equity => &[
                UsLargeCap,
                UsMidCap,
                UsSmallCap,
                International,
                EmergingMarkets,
            ],
            AssetClass::FixedIncome => &[Treasury, Corporate, Municipal, Tips, InternationalBond],
            AssetClass::CashEquivalent => &[MoneyMarket, Cash],
            AssetClass::RealAsset => &[Reit, Commodity],
            AssetClass::Alternative => &[Crypto, OtherAlternative],
            AssetClass::NotSet => &[AssetSubclass::NotSet],
        }
    }

    pub fn contains(self, subclass: AssetSubclass) -> bool {
        subclass.class() == self
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetClass::Equity => "Equity",
            AssetClass::FixedIncome => "FixedIncome",
            AssetClass::CashEquivalent => "CashEquivalent",
            AssetClass::RealAsset => "RealAsset",
            AssetClass::Alternative => "Alternative",
            AssetClass::NotSet => "NotSet",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetClass::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown asset class: {s}"))
    }
}

/// Finer classification of a security, always belonging to exactly one
/// [`AssetClass`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum AssetSubclass {
    UsLargeCap,
    UsMidCap,
    UsSmallCap,
    International,
    EmergingMarkets,
    Treasury,
    Corporate,
    Municipal,
    Tips,
    InternationalBond,
    MoneyMarket,
    Cash,
    Reit,
    Commodity,
    Crypto,
    OtherAlternative,
    NotSet,
}

impl AssetSubclass {
    pub const ALL: [AssetSubclass; 17] = [
        AssetSubclass::UsLargeCap,
        AssetSubclass::UsMidCap,
        AssetSubclass::UsSmallCap,
        AssetSubclass::International,
        AssetSubclass::EmergingMarkets,
        AssetSubclass::Treasury,
        AssetSubclass::Corporate,
        AssetSubclass::Municipal,
        AssetSubclass::Tips,
        AssetSubclass::InternationalBond,
        AssetSubclass::MoneyMarket,
        AssetSubclass::Cash,
        AssetSubclass::Reit,
        AssetSubclass::Commodity,
        AssetSubclass::Crypto,
        AssetSubclass::OtherAlternative,
        AssetSubclass::NotSet,
    ];

    /// The asset class this subclass belongs to.
    pub fn class(self) -> AssetClass {
        use AssetSubclass::*;
        match self {
            UsLargeCap | UsMidCap | UsSmallCap | International | EmergingMarkets => {
                AssetClass::Equity
            }
            Treasury | Corporate | Municipal | Tips | InternationalBond => AssetClass::FixedIncome,
            MoneyMarket | Cash => AssetClass::CashEquivalent,
            Reit | Commodity => AssetClass::RealAsset,
            Crypto | OtherAlternative => AssetClass::Alternative,
            NotSet => AssetClass::NotSet,
        }
    }

    pub fn name(self) -> &'static str {
        use AssetSubclass::*;
        match self {
            UsLargeCap => "UsLargeCap",
            UsMidCap => "UsMidCap",
            UsSmallCap => "UsSmallCap",
            International => "International",
            EmergingMarkets => "EmergingMarkets",
            Treasury => "Treasury",
            Corporate => "Corporate",
            Municipal => "Municipal",
            Tips => "Tips",
            InternationalBond => "InternationalBond",
            MoneyMarket => "MoneyMarket",
            Cash => "Cash",
            Reit => "Reit",
            Commodity => "Commodity",
            Crypto => "Crypto",
            OtherAlternative => "OtherAlternative",
            NotSet => "NotSet",
        }
    }
}

impl fmt::Display for AssetSubclass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetSubclass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetSubclass::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown asset subclass: {s}"))
    }
}
