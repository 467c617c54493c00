//! CSV templates for bills entered by hand: simple bills and yearly
//! depreciation bills. Dates are `YYYY-MM-DD`; enum columns take the variant
//! name, e.g. `BirchLane` or `TownshipTax`.

use super::{parse_amount, require_amount, store_bill, ImportError};
use crate::core::{Address, Provider};
use crate::models::{
    BillBase, BillId, DepreciationBillData, PropertyId, SimpleBillData, TaxRelatedCost,
};
use crate::store::{BillRepository, RealEstateRepository};
use chrono::NaiveDate;
use homebooks_derive::CsvSchema;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer};

/// Column documentation of a CSV template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// One row of the simple bill template.
#[derive(Debug, Clone, Deserialize, JsonSchema, CsvSchema)]
pub struct SimpleBillRecord {
    /// Property the bill belongs to
    pub real_estate: Address,
    /// Issuer of the bill
    pub provider: Provider,
    /// First day of the billed period
    pub start_date: NaiveDate,
    /// Last day of the billed period
    pub end_date: NaiveDate,
    /// Amount billed
    #[serde(deserialize_with = "amount")]
    #[schemars(with = "Decimal")]
    pub total_cost: Decimal,
    /// Deductible part; empty uses the default for the property
    #[serde(deserialize_with = "optional_amount")]
    #[schemars(with = "Option<Decimal>")]
    pub tax_related_cost: Option<Decimal>,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// One row of the depreciation bill template.
#[derive(Debug, Clone, Deserialize, JsonSchema, CsvSchema)]
pub struct DepreciationBillRecord {
    /// Property the depreciated item belongs to
    pub real_estate: Address,
    /// Item name as stored on the real property value
    pub item: String,
    /// Purchase date of the item, part of its key
    pub purchase_date: NaiveDate,
    /// Year the depreciation is claimed for
    pub tax_year: i32,
    /// Depreciation for the whole year
    #[serde(deserialize_with = "amount")]
    #[schemars(with = "Decimal")]
    pub total_cost: Decimal,
    /// Business use share of the year, 0 to 100
    #[serde(deserialize_with = "amount")]
    #[schemars(with = "Decimal")]
    pub period_usage_pct: Decimal,
    /// Dec 31 of the tax year when set
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Amount columns use the statement grammar, e.g. `$1,200.00` or `(45.10)`,
/// and keep the places written in the file.
fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let value = String::deserialize(deserializer)?;
    require_amount(&value, "amount").map_err(de::Error::custom)
}

fn optional_amount<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse_amount(&value).map_err(de::Error::custom)
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn tax_year_bounds(tax_year: i32) -> Result<(NaiveDate, NaiveDate), ImportError> {
    let start = NaiveDate::from_ymd_opt(tax_year, 1, 1);
    let end = NaiveDate::from_ymd_opt(tax_year, 12, 31);
    start.zip(end).ok_or_else(|| ImportError::InvalidDate {
        value: tax_year.to_string(),
        format: "%Y",
    })
}

impl SimpleBillRecord {
    fn into_bill(self, source_file: &str) -> (SimpleBillData, TaxRelatedCost) {
        let choice = self
            .tax_related_cost
            .map_or(TaxRelatedCost::Default, TaxRelatedCost::Explicit);
        let bill = SimpleBillData {
            base: BillBase {
                real_estate: self.real_estate,
                service_provider: self.provider,
                start_date: self.start_date,
                end_date: self.end_date,
                total_cost: self.total_cost,
                tax_related_cost: Decimal::ZERO,
                paid_date: self.paid_date,
                notes: self.notes,
                source_file: source_file.to_string(),
            },
        };
        (bill, choice)
    }
}

pub fn import_simple_bills<S>(
    store: &mut S,
    content: &str,
    source_file: &str,
) -> Result<Vec<BillId>, ImportError>
where
    S: RealEstateRepository + BillRepository,
{
    let bills = reader(content)
        .deserialize()
        .map(|record| {
            let record: SimpleBillRecord = record?;
            Ok(record.into_bill(source_file))
        })
        .collect::<Result<Vec<_>, ImportError>>()?;

    let mut ids = Vec::with_capacity(bills.len());
    for (bill, choice) in bills {
        let (id, _) = store_bill(store, bill, choice)?;
        ids.push(id);
    }
    log::info!("imported {} simple bills from {}", ids.len(), source_file);
    Ok(ids)
}

fn find_property_value<S: RealEstateRepository>(
    store: &S,
    real_estate: Address,
    item: &str,
    purchase_date: NaiveDate,
) -> Result<PropertyId, ImportError> {
    store
        .property_values()
        .into_iter()
        .find(|(_, value)| {
            value.real_estate == real_estate
                && value.item == item
                && value.purchase_date == purchase_date
        })
        .map(|(id, _)| id)
        .ok_or_else(|| ImportError::PropertyValueNotFound {
            real_estate,
            item: item.to_string(),
            purchase_date,
        })
}

pub fn import_depreciation_bills<S>(
    store: &mut S,
    content: &str,
    source_file: &str,
) -> Result<Vec<BillId>, ImportError>
where
    S: RealEstateRepository + BillRepository,
{
    let mut bills = Vec::new();
    for record in reader(content).deserialize() {
        let record: DepreciationBillRecord = record?;
        let property =
            find_property_value(&*store, record.real_estate, &record.item, record.purchase_date)?;
        let (start_date, end_date) = tax_year_bounds(record.tax_year)?;
        bills.push(DepreciationBillData {
            base: BillBase {
                real_estate: record.real_estate,
                service_provider: Provider::Depreciation,
                start_date,
                end_date,
                total_cost: record.total_cost,
                tax_related_cost: Decimal::ZERO,
                paid_date: record.paid_date,
                notes: record.notes,
                source_file: source_file.to_string(),
            },
            real_property_value: property,
            period_usage_pct: record.period_usage_pct,
        });
    }

    let mut ids = Vec::with_capacity(bills.len());
    for bill in bills {
        let (id, _) = store_bill(store, bill, TaxRelatedCost::Default)?;
        ids.push(id);
    }
    log::info!("imported {} depreciation bills from {}", ids.len(), source_file);
    Ok(ids)
}
