//! Estimate command - what a utility bill would have cost with different usage

use super::Context;
use crate::calc::estimator::{create_electric_estimate, create_natgas_estimate, solar_offset_kwh};
use crate::importers::solar::read_hourly;
use crate::models::{Bill, BillId};
use crate::store::BillRepository;
use anyhow::Context as _;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EstimateCommand {
    #[command(subcommand)]
    utility: EstimateUtility,
}

#[derive(Subcommand, Debug)]
pub enum EstimateUtility {
    /// Estimate an electric bill
    Electric {
        /// Id of the actual bill
        bill: u64,
        /// kWh added to the actual usage
        #[arg(long, default_value_t = Decimal::ZERO, allow_hyphen_values = true)]
        delta: Decimal,
        /// Solar export XLSX; kWh produced and used on site are added back
        #[arg(long)]
        solar: Option<PathBuf>,
    },
    /// Estimate a gas bill
    Gas {
        /// Id of the actual bill
        bill: u64,
        /// Therms added to the actual usage
        #[arg(long, default_value_t = Decimal::ZERO, allow_hyphen_values = true)]
        delta: Decimal,
    },
}

impl EstimateCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut store = ctx.open_store()?;
        let id = match &self.utility {
            EstimateUtility::Electric { bill, delta, solar } => {
                let actual = BillId(*bill);
                let mut delta = *delta;
                if let Some(path) = solar {
                    let base = store
                        .data()
                        .bill(actual)
                        .map(|b| b.base().clone())
                        .with_context(|| format!("bill {actual} not found"))?;
                    let hourly = read_hourly(path)?;
                    let offset = solar_offset_kwh(&hourly, base.start_date, base.end_date);
                    log::info!(
                        "solar self consumption {} kWh between {} and {}",
                        offset,
                        base.start_date,
                        base.end_date
                    );
                    delta += offset;
                }
                store.atomic(|data| create_electric_estimate(data, actual, delta))?
            }
            EstimateUtility::Gas { bill, delta } => {
                store.atomic(|data| create_natgas_estimate(data, BillId(*bill), *delta))?
            }
        };
        store.save()?;

        if let Some(bill) = store.data().bill(id) {
            print_estimate(id, bill);
        }
        Ok(())
    }
}

fn print_estimate(id: BillId, bill: &Bill) {
    let base = bill.base();
    println!(
        "Stored {} estimate {} for {} {} to {}",
        bill.kind(),
        id,
        base.real_estate,
        base.start_date,
        base.end_date
    );
    match bill {
        Bill::Electric(data) => {
            println!("  usage:    {} kWh", data.total_kwh);
            println!("  delivery: {}", data.delivery_cost);
            println!("  supply:   {}", data.supply_cost);
        }
        Bill::NatGas(data) => {
            println!("  usage:    {} therms", data.total_therms);
            println!("  delivery: {}", data.delivery_cost);
            println!("  supply:   {}", data.supply_cost);
        }
        _ => {}
    }
    println!("  total:    {}", base.total_cost);
    if let Some(notes) = &base.notes {
        println!("  notes:    {notes}");
    }
}
