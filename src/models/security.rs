use super::ValidationError;
use crate::core::identifier::parse_identifier;
use crate::core::{AssetClass, AssetSubclass};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// `XX_NNNNNNN`, prefix determined by the asset class
    pub identifier: String,
    pub ticker: String,
    pub name: String,
    pub asset_class: AssetClass,
    pub asset_subclass: AssetSubclass,
}

impl Security {
    /// Placeholder created when an import meets an unknown ticker.
    pub fn placeholder(identifier: String, ticker: &str, name: &str) -> Self {
        Security {
            identifier,
            ticker: ticker.to_string(),
            name: name.to_string(),
            asset_class: AssetClass::NotSet,
            asset_subclass: AssetSubclass::NotSet,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.asset_class == AssetClass::NotSet
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.asset_class.contains(self.asset_subclass) {
            return Err(ValidationError::SubclassMismatch {
                class: self.asset_class,
                subclass: self.asset_subclass,
            });
        }
        let (class, _) = parse_identifier(&self.identifier)
            .map_err(|_| ValidationError::MalformedIdentifier(self.identifier.clone()))?;
        if class != self.asset_class {
            return Err(ValidationError::IdentifierPrefix {
                identifier: self.identifier.clone(),
                class: self.asset_class,
            });
        }
        Ok(())
    }
}
