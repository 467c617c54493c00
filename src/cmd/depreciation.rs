//! Depreciation command - yearly depreciation of property items

use super::{print_table, today, Context};
use crate::calc::depreciation::{
    apply_period_usage, calculate_depreciation_for_year, create_depreciation_bills,
    depreciation_ratio_for_tax_year,
};
use crate::core::{Address, DepreciationClass};
use crate::store::{BillRepository, RealEstateRepository};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct DepreciationCommand {
    #[command(subcommand)]
    action: DepreciationAction,
}

#[derive(Subcommand, Debug)]
pub enum DepreciationAction {
    /// Show the depreciation of every property item for a tax year
    Calc { tax_year: i32 },
    /// Store a depreciation bill for every item with depreciation left
    Create { tax_year: i32 },
    /// Scale the year's depreciation bills by their period usage
    ApplyUsage { tax_year: i32 },
}

#[derive(Tabled)]
struct DepreciationRow {
    #[tabled(rename = "Property")]
    real_estate: Address,
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Class")]
    class: DepreciationClass,
    #[tabled(rename = "Cost Basis")]
    cost_basis: Decimal,
    #[tabled(rename = "Ratio")]
    ratio: Decimal,
    #[tabled(rename = "Prior")]
    prior: Decimal,
    #[tabled(rename = "Max")]
    max_possible: Decimal,
    #[tabled(rename = "Year")]
    year: Decimal,
}

impl DepreciationCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut store = ctx.open_store()?;
        match self.action {
            DepreciationAction::Calc { tax_year } => {
                let data = store.data();
                let mut rows = Vec::new();
                for (id, property) in data.property_values() {
                    let prior = data.depreciation_before(id, tax_year);
                    let amount =
                        calculate_depreciation_for_year(property, tax_year, prior, today())?;
                    rows.push(DepreciationRow {
                        real_estate: property.real_estate,
                        item: property.item.clone(),
                        class: property.depreciation_class,
                        cost_basis: property.cost_basis,
                        ratio: depreciation_ratio_for_tax_year(
                            property.depreciation_class.params(),
                            property.purchase_date,
                            property.disposal_date,
                            tax_year,
                        )
                        .round_dp(6),
                        prior,
                        max_possible: amount.max_possible,
                        year: amount.year,
                    });
                }
                print_table(&rows, "No property values found");
            }
            DepreciationAction::Create { tax_year } => {
                let ids = store.atomic(|data| create_depreciation_bills(data, tax_year, today()))?;
                store.save()?;
                println!("Stored {} depreciation bills for {tax_year}", ids.len());
            }
            DepreciationAction::ApplyUsage { tax_year } => {
                let ids = store.atomic(|data| apply_period_usage(data, tax_year))?;
                store.save()?;
                println!("Applied period usage to {} bills for {tax_year}", ids.len());
            }
        }
        Ok(())
    }
}
