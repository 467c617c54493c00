//! Positional text tables extracted from PDF statements.
//!
//! Extracted text keeps the column layout of the statement: cells on a line
//! are separated by runs of two or more spaces. A row is found by its label
//! (the first cell) and values are read by position after the label.

use super::{parse_amount, parse_date, parse_percent, ImportError};
use crate::core::Address;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// Date format of statement dates, `May 29, 2024`.
pub const STATEMENT_DATE_FORMAT: &str = "%b %d, %Y";

pub fn extract_text(bytes: &[u8]) -> Result<String, ImportError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ImportError::Pdf(e.to_string()))
}

pub fn read_pdf_text(path: &std::path::Path) -> Result<String, ImportError> {
    let bytes = super::read_file(path)?;
    extract_text(&bytes)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextTable {
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn parse(text: &str) -> Self {
        static SEPARATOR: OnceLock<Regex> = OnceLock::new();
        let separator = SEPARATOR.get_or_init(|| Regex::new(r"\s{2,}|\t").expect("valid regex"));
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                separator
                    .split(line)
                    .map(|cell| cell.trim().to_string())
                    .filter(|cell| !cell.is_empty())
                    .collect()
            })
            .collect();
        TextTable { rows }
    }

    /// The first row labelled `anchor`, without the label.
    pub fn row(&self, anchor: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.first().is_some_and(|label| label.eq_ignore_ascii_case(anchor)))
            .map(|row| &row[1..])
    }

    pub fn has_row(&self, anchor: &str) -> bool {
        self.row(anchor).is_some()
    }

    /// Cell `index` after the label of the `anchor` row.
    pub fn cell(&self, anchor: &'static str, index: usize) -> Result<&str, ImportError> {
        let row = self.row(anchor).ok_or(ImportError::MissingAnchor(anchor))?;
        row.get(index)
            .map(String::as_str)
            .ok_or(ImportError::MissingCell { anchor, index })
    }

    pub fn amount(&self, anchor: &'static str, index: usize) -> Result<Decimal, ImportError> {
        parse_amount(self.cell(anchor, index)?)?.ok_or(ImportError::MissingValue(anchor))
    }

    /// Like [`TextTable::amount`] but an absent row reads as `None`.
    pub fn optional_amount(
        &self,
        anchor: &'static str,
        index: usize,
    ) -> Result<Option<Decimal>, ImportError> {
        if !self.has_row(anchor) {
            return Ok(None);
        }
        parse_amount(self.cell(anchor, index)?)
    }

    /// A usage cell such as `546 kWh`; the unit is dropped.
    pub fn quantity(&self, anchor: &'static str, index: usize) -> Result<Decimal, ImportError> {
        let cell = self.cell(anchor, index)?;
        let number = cell.split_whitespace().next().unwrap_or_default();
        parse_amount(number)?.ok_or(ImportError::MissingValue(anchor))
    }

    pub fn percent(&self, anchor: &'static str, index: usize) -> Result<Decimal, ImportError> {
        parse_percent(self.cell(anchor, index)?)?.ok_or(ImportError::MissingValue(anchor))
    }

    pub fn date(&self, anchor: &'static str, index: usize) -> Result<NaiveDate, ImportError> {
        parse_date(self.cell(anchor, index)?, STATEMENT_DATE_FORMAT)
    }
}

/// `Billing period  May 29, 2024 to Jun 27, 2024`.
pub fn billing_period(text: &str) -> Result<(NaiveDate, NaiveDate), ImportError> {
    static PERIOD: OnceLock<Regex> = OnceLock::new();
    let re = PERIOD.get_or_init(|| {
        Regex::new(r"(?i)billing period\s+([A-Z][a-z]{2} \d{1,2}, \d{4})\s+to\s+([A-Z][a-z]{2} \d{1,2}, \d{4})")
            .expect("valid regex")
    });
    let captures = re
        .captures(text)
        .ok_or(ImportError::MissingAnchor("Billing period"))?;
    let start = parse_date(&captures[1], STATEMENT_DATE_FORMAT)?;
    let end = parse_date(&captures[2], STATEMENT_DATE_FORMAT)?;
    Ok((start, end))
}

pub fn find_address(text: &str, source: &str) -> Result<Address, ImportError> {
    Address::find_in_text(text).ok_or_else(|| ImportError::AddressNotFound(source.to_string()))
}
