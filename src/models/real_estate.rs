use super::{ensure_date_order, ensure_non_negative, ValidationError};
use crate::core::{Address, DepreciationClass, Provider, RoundFields, TaxCategory};
use chrono::NaiveDate;
use homebooks_derive::RoundFields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A property, one row per [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealEstate {
    pub address: Address,
    pub units: u32,
    pub square_feet: u32,
    pub purchase_date: NaiveDate,
    /// Drives the default tax related cost of every bill for this property.
    pub bill_tax_related: bool,
}

/// A depreciable asset of a property. Unique on
/// `(real_estate, item, purchase_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, RoundFields)]
pub struct RealPropertyValue {
    pub real_estate: Address,
    pub item: String,
    pub purchase_date: NaiveDate,
    pub disposal_date: Option<NaiveDate>,
    #[round(dp = 2)]
    pub cost_basis: Decimal,
    pub depreciation_class: DepreciationClass,
}

impl RealPropertyValue {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("cost_basis", self.cost_basis)?;
        if let Some(disposal) = self.disposal_date {
            ensure_date_order("property purchase/disposal", self.purchase_date, disposal)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub provider: Provider,
    pub tax_category: TaxCategory,
}

impl From<Provider> for ServiceProvider {
    fn from(provider: Provider) -> Self {
        ServiceProvider {
            provider,
            tax_category: provider.default_tax_category(),
        }
    }
}
