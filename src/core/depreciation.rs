use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MACRS depreciation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DepreciationSystem {
    None,
    /// General Depreciation System
    Gds,
    /// Alternative Depreciation System
    Ads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PropertyClass {
    None,
    ResidentialRental,
    NonresidentialReal,
    LandImprovement,
    FiveYear,
    SevenYear,
    Land,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DepreciationMethod {
    None,
    StraightLine,
}

/// Timing convention applied in the month of acquisition and disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Convention {
    None,
    /// Placed in service (or disposed of) at the middle of the month.
    MidMonth,
    /// The acquisition month counts in full, the disposal month not at all.
    FullMonth,
}

/// Depreciation class recorded on a depreciable property. Each class fixes
/// the system, property class, method and convention used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DepreciationClass {
    None,
    ResidentialRentalGds,
    ResidentialRentalAds,
    NonresidentialRealGds,
    LandImprovementGds,
    FiveYearGds,
    SevenYearGds,
    Land,
}

/// The four components a depreciation class resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepreciationParams {
    pub system: DepreciationSystem,
    pub property_class: PropertyClass,
    pub method: DepreciationMethod,
    pub convention: Convention,
}

impl DepreciationParams {
    /// True when any component is unset, in which case nothing is depreciated.
    pub fn has_none(&self) -> bool {
        self.system == DepreciationSystem::None
            || self.property_class == PropertyClass::None
            || self.method == DepreciationMethod::None
            || self.convention == Convention::None
    }
}

impl DepreciationClass {
    pub const ALL: [DepreciationClass; 8] = [
        DepreciationClass::None,
        DepreciationClass::ResidentialRentalGds,
        DepreciationClass::ResidentialRentalAds,
        DepreciationClass::NonresidentialRealGds,
        DepreciationClass::LandImprovementGds,
        DepreciationClass::FiveYearGds,
        DepreciationClass::SevenYearGds,
        DepreciationClass::Land,
    ];

    pub fn params(self) -> DepreciationParams {
        use Convention::{FullMonth, MidMonth};
        use DepreciationMethod::StraightLine;
        use DepreciationSystem::{Ads, Gds};
        let (system, property_class, method, convention) = match self {
            DepreciationClass::None => (
                DepreciationSystem::None,
                PropertyClass::None,
                DepreciationMethod::None,
                Convention::None,
            ),
            DepreciationClass::ResidentialRentalGds => {
                (Gds, PropertyClass::ResidentialRental, StraightLine, MidMonth)
            }
            DepreciationClass::ResidentialRentalAds => {
                (Ads, PropertyClass::ResidentialRental, StraightLine, MidMonth)
            }
            DepreciationClass::NonresidentialRealGds => {
                (Gds, PropertyClass::NonresidentialReal, StraightLine, MidMonth)
            }
            DepreciationClass::LandImprovementGds => {
                (Gds, PropertyClass::LandImprovement, StraightLine, FullMonth)
            }
            DepreciationClass::FiveYearGds => {
                (Gds, PropertyClass::FiveYear, StraightLine, FullMonth)
            }
            DepreciationClass::SevenYearGds => {
                (Gds, PropertyClass::SevenYear, StraightLine, FullMonth)
            }
            DepreciationClass::Land => (Gds, PropertyClass::Land, StraightLine, FullMonth),
        };
        DepreciationParams {
            system,
            property_class,
            method,
            convention,
        }
    }
}

impl fmt::Display for DepreciationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for DepreciationClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DepreciationClass::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown depreciation class: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_none_class_has_unset_components() {
        for class in DepreciationClass::ALL {
            assert_eq!(
                class.params().has_none(),
                class == DepreciationClass::None,
                "{class}"
            );
        }
    }

    #[test]
    fn parse_round_trip() {
        for class in DepreciationClass::ALL {
            assert_eq!(class.to_string().parse::<DepreciationClass>(), Ok(class));
        }
    }
}
