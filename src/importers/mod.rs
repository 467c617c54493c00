//! Statement parsers. Every importer reads its whole input and resolves
//! references before returning records; the callers insert inside one
//! [`Store::atomic`](crate::store::Store::atomic) call so a failed import
//! writes nothing.

pub mod fidelity;
pub mod mortgage;
pub mod news;
pub mod pdf;
pub mod pseg_electric;
pub mod pseg_gas;
pub mod rates;
pub mod solar;
pub mod templates;

use crate::core::{generate_id, Address, AssetClass, IdentifierError, Provider, RoundFields};
use crate::market_data::MarketDataError;
use crate::models::{
    Bill, BillId, BillRecord, Security, SecurityId, TaxRelatedCost, ValidationError,
};
use crate::store::{BillRepository, RealEstateRepository, SecurityRepository, StoreError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

/// Broad class of an import failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced account, provider, property or address does not exist.
    Reference,
    /// The input does not have the expected shape.
    Format,
    /// A record violates a cross-field invariant.
    Validation,
    /// A call to an external service failed.
    External,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("account not found: broker {broker}, account {account_id}")]
    AccountNotFound { broker: String, account_id: String },
    #[error("real estate not found: {0}")]
    RealEstateNotFound(Address),
    #[error("service provider not found: {0}")]
    ProviderNotFound(Provider),
    #[error("no known address found in {0}")]
    AddressNotFound(String),
    #[error("real property value not found: {real_estate} {item} purchased {purchase_date}")]
    PropertyValueNotFound {
        real_estate: Address,
        item: String,
        purchase_date: NaiveDate,
    },
    #[error("unknown {what}: {value}")]
    UnknownReference { what: &'static str, value: String },

    #[error("no header row starting with '{0}'")]
    MissingHeader(&'static str),
    #[error("found {groups} lot groups for {parents} closed positions")]
    LotGroupMismatch { groups: usize, parents: usize },
    #[error("lot row on line {0} does not follow an ASSOCIATED LOTS row")]
    OrphanLot(usize),
    #[error("unknown transaction action: {0}")]
    UnknownAction(String),
    #[error("no old ticker found in merger action: {0}")]
    MergerTicker(String),
    #[error("{date} has {count} hourly rows, expected 24")]
    IncompleteDay { date: NaiveDate, count: usize },
    #[error("missing '{0}' row")]
    MissingAnchor(&'static str),
    #[error("'{anchor}' row has no cell {index}")]
    MissingCell { anchor: &'static str, index: usize },
    #[error("invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("invalid date '{value}', expected format {format}")]
    InvalidDate { value: String, format: &'static str },
    #[error("unexpected header: expected {expected}, found {found}")]
    UnexpectedHeader { expected: String, found: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to extract pdf text: {0}")]
    Pdf(String),
    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::AccountNotFound { .. }
            | ImportError::RealEstateNotFound(_)
            | ImportError::ProviderNotFound(_)
            | ImportError::AddressNotFound(_)
            | ImportError::PropertyValueNotFound { .. }
            | ImportError::UnknownReference { .. } => ErrorKind::Reference,
            ImportError::MissingHeader(_)
            | ImportError::LotGroupMismatch { .. }
            | ImportError::OrphanLot(_)
            | ImportError::UnknownAction(_)
            | ImportError::MergerTicker(_)
            | ImportError::IncompleteDay { .. }
            | ImportError::MissingAnchor(_)
            | ImportError::MissingCell { .. }
            | ImportError::InvalidAmount(_)
            | ImportError::MissingValue(_)
            | ImportError::InvalidDate { .. }
            | ImportError::UnexpectedHeader { .. }
            | ImportError::Csv(_)
            | ImportError::Pdf(_)
            | ImportError::Workbook(_) => ErrorKind::Format,
            ImportError::Validation(_) | ImportError::Identifier(_) => ErrorKind::Validation,
            ImportError::Store(err) => match err {
                StoreError::NotFound { .. } => ErrorKind::Reference,
                StoreError::Io { .. } => ErrorKind::Io,
                StoreError::Json { .. } => ErrorKind::Format,
                StoreError::Duplicate { .. }
                | StoreError::Protected { .. }
                | StoreError::Validation(_)
                | StoreError::Identifier(_) => ErrorKind::Validation,
            },
            ImportError::MarketData(_) => ErrorKind::External,
            ImportError::Io { .. } => ErrorKind::Io,
        }
    }
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<Vec<u8>, ImportError> {
    std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// File name recorded on imported records.
pub fn source_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The table of an export: from the first line starting with `first_column`
/// up to the first blank line. Preamble and footer lines are dropped.
pub fn table_section(content: &str, first_column: &'static str) -> Result<String, ImportError> {
    let mut lines = content
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}'))
        .skip_while(|line| !line.trim_start_matches('"').starts_with(first_column));
    let header = lines
        .next()
        .ok_or(ImportError::MissingHeader(first_column))?;
    let mut table = String::from(header);
    table.push('\n');
    for line in lines.take_while(|line| !line.trim().is_empty()) {
        table.push_str(line);
        table.push('\n');
    }
    Ok(table)
}

/// Parse a statement amount. Accepts `$`, thousands separators, a leading
/// `+`/`-` and parentheses for negatives; `""` and `"--"` are absent.
pub fn parse_amount(value: &str) -> Result<Option<Decimal>, ImportError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "--" {
        return Ok(None);
    }
    let (negative, inner) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    let amount = Decimal::from_str(cleaned)
        .map_err(|_| ImportError::InvalidAmount(value.to_string()))?;
    Ok(Some(if negative { -amount } else { amount }))
}

pub fn require_amount(value: &str, field: &'static str) -> Result<Decimal, ImportError> {
    parse_amount(value)?.ok_or(ImportError::MissingValue(field))
}

/// `6.625%` becomes `0.06625`.
pub fn parse_percent(value: &str) -> Result<Option<Decimal>, ImportError> {
    let trimmed = value.trim();
    let Some(number) = trimmed.strip_suffix('%') else {
        return Err(ImportError::InvalidAmount(value.to_string()));
    };
    Ok(parse_amount(number)?.map(|pct| pct / Decimal::ONE_HUNDRED))
}

pub fn parse_date(value: &str, format: &'static str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(value.trim(), format).map_err(|_| ImportError::InvalidDate {
        value: value.to_string(),
        format,
    })
}

/// Find a security by ticker, creating a `NotSet` placeholder for unknown
/// tickers. Created securities are appended to `created`.
pub fn resolve_security<S: SecurityRepository>(
    store: &mut S,
    ticker: &str,
    name: &str,
    created: &mut Vec<Security>,
) -> Result<SecurityId, ImportError> {
    if let Some(id) = store.find_security(ticker) {
        return Ok(id);
    }
    let identifier = generate_id(&*store, AssetClass::NotSet)?;
    let security = Security::placeholder(identifier, ticker, name);
    log::warn!(
        "created placeholder security {} for unknown ticker {}",
        security.identifier,
        ticker
    );
    let id = store.insert_security(security.clone())?;
    created.push(security);
    Ok(id)
}

/// Resolve the bill's real estate and provider, apply the tax related cost
/// choice and store the bill.
pub fn store_bill<S, B>(
    store: &mut S,
    bill: B,
    tax_related_cost: TaxRelatedCost,
) -> Result<(BillId, Bill), ImportError>
where
    S: RealEstateRepository + BillRepository,
    B: BillRecord,
{
    let mut bill = bill;
    let address = bill.base().real_estate;
    let provider = bill.base().service_provider;
    let real_estate = store
        .real_estate(address)
        .ok_or(ImportError::RealEstateNotFound(address))?
        .clone();
    if store.service_provider(provider).is_none() {
        return Err(ImportError::ProviderNotFound(provider));
    }
    bill.set_tax_related_cost(tax_related_cost, &real_estate);
    bill.round_fields();
    bill.validate()?;
    let bill = bill.into_bill();
    let id = store.insert_bill(bill.clone())?;
    log::info!(
        "stored {} bill {} for {} {} to {}",
        bill.kind(),
        id,
        address,
        bill.base().start_date,
        bill.base().end_date
    );
    Ok((id, bill))
}
