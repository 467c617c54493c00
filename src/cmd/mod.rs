pub mod bill;
pub mod depreciation;
pub mod estimate;
pub mod import;
pub mod init;
pub mod market;
pub mod report;
pub mod schema;
pub mod security;

use crate::market_data::AlphaVantage;
use crate::store::Store;
use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub store: PathBuf,
    pub api_key: Option<String>,
}

impl Context {
    pub fn open_store(&self) -> anyhow::Result<Store> {
        Store::open(&self.store)
            .with_context(|| format!("failed to open store {}", self.store.display()))
    }

    pub fn market_data(&self) -> anyhow::Result<AlphaVantage> {
        let key = self
            .api_key
            .as_deref()
            .context("an AlphaVantage API key is required (--api-key or ALPHAVANTAGE_API_KEY)")?;
        Ok(AlphaVantage::new(key)?)
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub(crate) fn print_table<T: Tabled>(rows: &[T], empty: &str) {
    if rows.is_empty() {
        println!("{empty}");
        return;
    }
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
