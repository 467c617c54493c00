//! Import command - load statements, bills, rate tables and news into the store

use super::{read_input, Context};
use crate::core::Address;
use crate::importers::{
    fidelity, mortgage, news, pseg_electric, pseg_gas, rates, solar, source_name, templates,
};
use crate::market_data::Topic;
use crate::models::TaxRelatedCost;
use anyhow::Context as _;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ImportCommand {
    #[command(subcommand)]
    source: ImportSource,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PdfBill {
    /// PSE&G electric bill
    Electric,
    /// PSE&G gas bill
    Gas,
    /// Wells Fargo mortgage statement
    Mortgage,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Utility {
    Electric,
    Gas,
}

#[derive(Subcommand, Debug)]
pub enum ImportSource {
    /// Fidelity transaction history CSV
    Transactions { file: PathBuf },
    /// Fidelity realized gain/loss CSV
    ClosedPositions { file: PathBuf },
    /// Fidelity positions CSV
    Positions {
        file: PathBuf,
        /// Date the positions were downloaded (YYYY-MM-DD)
        #[arg(long)]
        as_of: NaiveDate,
    },
    /// A PDF bill or statement
    Bill {
        #[arg(value_enum)]
        kind: PdfBill,
        file: PathBuf,
        /// Tax related cost; defaults to the property's policy
        #[arg(long)]
        tax_related_cost: Option<Decimal>,
    },
    /// Simple bill CSV template
    SimpleBills { file: PathBuf },
    /// Depreciation bill CSV template
    DepreciationBills { file: PathBuf },
    /// Monthly rate table CSV
    Rates {
        #[arg(value_enum)]
        utility: Utility,
        file: PathBuf,
    },
    /// Hourly solar production XLSX, stored as a solar bill for the period
    Solar {
        file: PathBuf,
        #[arg(long)]
        real_estate: Address,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Power purchase agreement rate per kWh
        #[arg(long)]
        ppa_rate: Decimal,
        #[arg(long)]
        tax_related_cost: Option<Decimal>,
    },
    /// News sentiment from AlphaVantage
    News {
        /// Comma separated tickers
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,
        #[arg(long, value_enum, value_delimiter = ',')]
        topics: Vec<Topic>,
        /// Only articles published after this time (YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        time_from: Option<NaiveDateTime>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

fn tax_choice(value: Option<Decimal>) -> TaxRelatedCost {
    value.map_or(TaxRelatedCost::Default, TaxRelatedCost::Explicit)
}

impl ImportCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut store = ctx.open_store()?;
        match &self.source {
            ImportSource::Transactions { file } => {
                let content = read_input(file)?;
                let name = source_name(file);
                let result =
                    store.atomic(|data| fidelity::transactions::import(data, &content, &name))?;
                for (account, date) in &result.skipped {
                    log::warn!("skipped account {account} on {date}: already imported");
                }
                println!(
                    "Imported {} transactions, {} new securities, {} ticker changes ({} account days skipped)",
                    result.transactions.len(),
                    result.new_securities.len(),
                    result.ticker_history.len(),
                    result.skipped.len()
                );
            }
            ImportSource::ClosedPositions { file } => {
                let content = read_input(file)?;
                let name = source_name(file);
                let result =
                    store.atomic(|data| fidelity::closed_positions::import(data, &content, &name))?;
                println!(
                    "Imported {} closed lots, {} new securities",
                    result.positions.len(),
                    result.new_securities.len()
                );
            }
            ImportSource::Positions { file, as_of } => {
                let content = read_input(file)?;
                let result =
                    store.atomic(|data| fidelity::positions::import(data, &content, *as_of))?;
                println!(
                    "Imported {} positions as of {}, {} new securities",
                    result.positions.len(),
                    as_of,
                    result.new_securities.len()
                );
            }
            ImportSource::Bill {
                kind,
                file,
                tax_related_cost,
            } => {
                let choice = tax_choice(*tax_related_cost);
                let id = store.atomic(|data| match kind {
                    PdfBill::Electric => pseg_electric::import(data, file, choice),
                    PdfBill::Gas => pseg_gas::import(data, file, choice),
                    PdfBill::Mortgage => mortgage::import(data, file, choice),
                })?;
                println!("Stored bill {id} from {}", file.display());
            }
            ImportSource::SimpleBills { file } => {
                let content = read_input(file)?;
                let name = source_name(file);
                let ids =
                    store.atomic(|data| templates::import_simple_bills(data, &content, &name))?;
                println!("Stored {} bills", ids.len());
            }
            ImportSource::DepreciationBills { file } => {
                let content = read_input(file)?;
                let name = source_name(file);
                let ids = store
                    .atomic(|data| templates::import_depreciation_bills(data, &content, &name))?;
                println!("Stored {} depreciation bills", ids.len());
            }
            ImportSource::Rates { utility, file } => {
                let content = read_input(file)?;
                let count = store.atomic(|data| match utility {
                    Utility::Electric => rates::import_electric_rates(data, &content),
                    Utility::Gas => rates::import_natgas_rates(data, &content),
                })?;
                println!("Imported {count} monthly rate rows");
            }
            ImportSource::Solar {
                file,
                real_estate,
                start,
                end,
                ppa_rate,
                tax_related_cost,
            } => {
                let id = store.atomic(|data| {
                    solar::import(
                        data,
                        file,
                        *real_estate,
                        *start,
                        *end,
                        *ppa_rate,
                        tax_choice(*tax_related_cost),
                    )
                })?;
                println!("Stored solar bill {id}");
            }
            ImportSource::News {
                tickers,
                topics,
                time_from,
                limit,
            } => {
                let source = ctx.market_data()?;
                let result = store.atomic(|data| {
                    news::import(data, &source, tickers, topics, *time_from, *limit)
                })?;
                println!(
                    "Stored {} news sentiment rows, {} already present",
                    result.inserted, result.skipped
                );
            }
        }
        store
            .save()
            .with_context(|| format!("failed to save {}", ctx.store.display()))
    }
}
