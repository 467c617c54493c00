//! Bill command - list stored bills and derive new ones from existing bills

use super::{print_table, Context};
use crate::core::Address;
use crate::models::bills::modify;
use crate::models::{BillId, BillOverrides, TaxRelatedCost};
use crate::report::bill_rows;
use crate::store::{BillRepository, RealEstateRepository, StoreError};
use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct BillCommand {
    #[command(subcommand)]
    action: BillAction,
}

#[derive(Subcommand, Debug)]
pub enum BillAction {
    /// List bills, optionally for one year and property
    List {
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(long)]
        real_estate: Option<Address>,
    },
    /// Store a copy of a bill with costs scaled and fields overridden
    Modify {
        /// Id of the bill to copy
        id: u64,
        /// Factor applied to every cost and usage field
        #[arg(long, default_value_t = Decimal::ONE)]
        ratio: Decimal,
        #[arg(long)]
        real_estate: Option<Address>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        paid: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        /// Explicit tax related cost
        #[arg(long, conflicts_with = "default_tax")]
        tax_related_cost: Option<Decimal>,
        /// Recompute the tax related cost from the target property's policy
        #[arg(long)]
        default_tax: bool,
    },
}

impl BillCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut store = ctx.open_store()?;
        match &self.action {
            BillAction::List { year, real_estate } => {
                let rows: Vec<_> = bill_rows(store.data(), *year)
                    .into_iter()
                    .filter(|r| real_estate.map_or(true, |a| r.real_estate == a))
                    .collect();
                print_table(&rows, "No bills found");
            }
            BillAction::Modify {
                id,
                ratio,
                real_estate,
                start,
                end,
                paid,
                notes,
                tax_related_cost,
                default_tax,
            } => {
                let tax_choice = match (tax_related_cost, default_tax) {
                    (Some(value), _) => Some(TaxRelatedCost::Explicit(*value)),
                    (None, true) => Some(TaxRelatedCost::Default),
                    (None, false) => None,
                };
                let overrides = BillOverrides {
                    ratio: *ratio,
                    real_estate: *real_estate,
                    start_date: *start,
                    end_date: *end,
                    paid_date: *paid,
                    notes: notes.clone(),
                    tax_related_cost: tax_choice,
                };
                let source_id = BillId(*id);
                let new_id = store.atomic(|data| -> anyhow::Result<BillId> {
                    let source = data
                        .bill(source_id)
                        .cloned()
                        .with_context(|| format!("bill {source_id} not found"))?;
                    let address = overrides
                        .real_estate
                        .unwrap_or(source.base().real_estate);
                    let target = data
                        .real_estate(address)
                        .cloned()
                        .ok_or_else(|| StoreError::NotFound {
                            entity: "real estate",
                            key: address.to_string(),
                        })?;
                    let bill = modify(&source, &overrides, &target)?;
                    Ok(data.insert_bill(bill)?)
                })?;
                store.save()?;
                println!("Stored bill {new_id} derived from bill {source_id}");
            }
        }
        Ok(())
    }
}
