//! Report command - bill, realized pnl and income summaries, optionally as XLSX

use super::{print_table, Context};
use crate::report::{write_workbook, Report};
use anyhow::Context as _;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Section {
    /// Bill totals by property and tax category
    TaxCategories,
    /// Bill totals by month and provider
    Monthly,
    /// Bill totals by provider
    Providers,
    /// Every bill
    Bills,
    /// Realized pnl by account and year sold
    Pnl,
    /// Dividend and interest income
    Income,
    /// All of the above
    #[default]
    All,
}

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// Calendar year to report; all years when omitted
    #[arg(short, long)]
    year: Option<i32>,

    /// Section to print
    #[arg(short, long, value_enum, default_value_t = Section::All)]
    section: Section,

    /// Also write every section to an XLSX workbook
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Open the workbook after writing it
    #[arg(long, requires = "output")]
    open: bool,
}

impl ReportCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        let store = ctx.open_store()?;
        let report = Report::build(store.data(), self.year);

        self.print(&report);

        if let Some(path) = &self.output {
            write_workbook(&report, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
            if self.open {
                opener::open(path)?;
            }
        }
        Ok(())
    }

    fn wants(&self, section: Section) -> bool {
        self.section == Section::All || self.section == section
    }

    fn print(&self, report: &Report) {
        let year = report
            .year
            .map_or_else(|| "all years".to_string(), |y| y.to_string());
        if self.wants(Section::TaxCategories) {
            println!("Tax categories ({year})");
            print_table(&report.tax_categories, "No bills found");
        }
        if self.wants(Section::Monthly) {
            println!("Monthly ({year})");
            print_table(&report.monthly, "No bills found");
        }
        if self.wants(Section::Providers) {
            println!("Providers ({year})");
            print_table(&report.providers, "No bills found");
        }
        if self.wants(Section::Bills) {
            println!("Bills ({year})");
            print_table(&report.bills, "No bills found");
        }
        if self.wants(Section::Pnl) {
            println!("Realized PnL ({year})");
            print_table(&report.realized_pnl, "No closed positions found");
        }
        if self.wants(Section::Income) {
            println!("Income ({year})");
            print_table(&report.income, "No income found");
        }
    }
}
