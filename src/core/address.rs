use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of real estate addresses records can belong to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Address {
    BirchLane,
    CedarAvenue,
    ElmStreet,
}

impl Address {
    pub const ALL: [Address; 3] = [Address::BirchLane, Address::CedarAvenue, Address::ElmStreet];

    pub fn full_address(self) -> &'static str {
        match self {
            Address::BirchLane => "12 Birch Lane, Maplewood, NJ 07040",
            Address::CedarAvenue => "345 Cedar Avenue, Unit 2, Hoboken, NJ 07030",
            Address::ElmStreet => "78 Elm Street, Montclair, NJ 07042",
        }
    }

    /// Street number and street name, the part matched against free text.
    fn street(self) -> &'static str {
        match self {
            Address::BirchLane => "12 Birch Lane",
            Address::CedarAvenue => "345 Cedar Avenue",
            Address::ElmStreet => "78 Elm Street",
        }
    }

    /// Find the address mentioned in free text, e.g. the service address block
    /// of a utility bill. Matching ignores case, punctuation and spacing, and
    /// treats street suffixes and their abbreviations alike.
    pub fn find_in_text(text: &str) -> Option<Address> {
        let haystack = format!(" {} ", normalize(text));
        Address::ALL.into_iter().find(|address| {
            let needle = format!(" {} ", normalize(address.street()));
            haystack.contains(&needle)
        })
    }
}

fn normalize(text: &str) -> String {
    text.to_uppercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| match token {
            "AVENUE" => "AVE",
            "STREET" => "ST",
            "LANE" => "LN",
            "ROAD" => "RD",
            "DRIVE" => "DR",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::ALL
            .into_iter()
            .find(|a| a.to_string().eq_ignore_ascii_case(s.trim()))
            .or_else(|| Address::find_in_text(s))
            .ok_or_else(|| format!("unknown address: {s}"))
    }
}
