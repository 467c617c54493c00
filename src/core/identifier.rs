use super::assets::AssetClass;

/// Width of the numeric identifier suffix.
pub const SUFFIX_WIDTH: usize = 7;
const MAX_SUFFIX: u32 = 9_999_999;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("malformed security identifier: {0}")]
    Malformed(String),
    #[error("identifier space exhausted for prefix {0}")]
    Exhausted(&'static str),
}

/// Lookup of the greatest identifier already issued for a prefix.
pub trait IdentifierSource {
    fn max_identifier(&self, prefix: &str) -> Option<String>;
}

/// Issue the next identifier for `class`: the current maximum suffix plus one,
/// starting at `0000001`. Callers run this in the same store transaction as
/// the insert that uses it.
pub fn generate_id<S: IdentifierSource + ?Sized>(
    source: &S,
    class: AssetClass,
) -> Result<String, IdentifierError> {
    let prefix = class.id_prefix();
    let next = match source.max_identifier(prefix) {
        Some(current) => {
            let (_, suffix) = parse_identifier(&current)?;
            if suffix >= MAX_SUFFIX {
                return Err(IdentifierError::Exhausted(prefix));
            }
            suffix + 1
        }
        None => 1,
    };
    Ok(format_identifier(class, next))
}

pub fn format_identifier(class: AssetClass, suffix: u32) -> String {
    format!("{}{:0width$}", class.id_prefix(), suffix, width = SUFFIX_WIDTH)
}

/// Split an identifier into its asset class and numeric suffix.
pub fn parse_identifier(identifier: &str) -> Result<(AssetClass, u32), IdentifierError> {
    let malformed = || IdentifierError::Malformed(identifier.to_string());
    if identifier.len() != 3 + SUFFIX_WIDTH || !identifier.is_ascii() {
        return Err(malformed());
    }
    let (prefix, digits) = identifier.split_at(3);
    let class = AssetClass::ALL
        .into_iter()
        .find(|c| c.id_prefix() == prefix)
        .ok_or_else(malformed)?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }
    let suffix = digits.parse().map_err(|_| malformed())?;
    Ok((class, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    struct Issued(BTreeSet<String>);

    impl IdentifierSource for Issued {
        fn max_identifier(&self, prefix: &str) -> Option<String> {
            self.0.iter().filter(|id| id.starts_with(prefix)).max().cloned()
        }
    }

    #[test]
    fn first_identifier_starts_at_one() {
        let issued = Issued(BTreeSet::new());
        assert_eq!(
            generate_id(&issued, AssetClass::Equity).unwrap(),
            "EQ_0000001"
        );
    }

    #[test]
    fn sequential_generation_has_no_gaps() {
        let mut issued = Issued(BTreeSet::new());
        issued.0.insert("FI_0000003".to_string());
        for _ in 0..25 {
            let id = generate_id(&issued, AssetClass::Equity).unwrap();
            issued.0.insert(id);
        }
        let suffixes: Vec<u32> = issued
            .0
            .iter()
            .filter(|id| id.starts_with("EQ_"))
            .map(|id| parse_identifier(id).unwrap().1)
            .collect();
        assert_eq!(suffixes, (1..=25).collect::<Vec<_>>());
        // other classes are independent
        assert_eq!(
            generate_id(&issued, AssetClass::FixedIncome).unwrap(),
            "FI_0000004"
        );
    }

    #[test]
    fn rejects_malformed_identifiers() {
        assert!(parse_identifier("EQ_12345").is_err());
        assert!(parse_identifier("XX_0000001").is_err());
        assert!(parse_identifier("EQ_00000a1").is_err());
        assert_eq!(
            parse_identifier("NS_0000042"),
            Ok((AssetClass::NotSet, 42))
        );
    }

    #[test]
    fn exhausted_prefix_is_an_error() {
        let issued = Issued(["CE_9999999".to_string()].into_iter().collect());
        assert_eq!(
            generate_id(&issued, AssetClass::CashEquivalent),
            Err(IdentifierError::Exhausted("CE_"))
        );
    }
}
