//! Persistence. Narrow repository traits per entity, an in-memory relational
//! implementation enforcing unique, foreign key and protect-on-delete rules,
//! and a JSON snapshot file.

mod memory;

pub use memory::MemoryStore;

use crate::core::{generate_id, AssetClass, AssetSubclass, IdentifierError, IdentifierSource};
use crate::models::{
    AccountId, Bill, BillId, BillKind, ClosedPosition, ElectricData, InvestmentAccount,
    NatGasData, NewsSentiment, Position, PropertyId, RealEstate, RealPropertyValue, Security,
    SecurityId, ServiceProvider, TickerHistory, Transaction, ValidationError, YearMonth,
};
use crate::core::{Address, Provider};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("cannot delete {entity} {key}: still referenced by {referenced_by}")]
    Protected {
        entity: &'static str,
        key: String,
        referenced_by: &'static str,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store file {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn duplicate(entity: &'static str, key: impl std::fmt::Display) -> Self {
        StoreError::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

pub trait AccountRepository {
    fn account(&self, id: AccountId) -> Option<&InvestmentAccount>;

    fn find_account(&self, broker: &str, account_id: &str) -> Option<AccountId>;

    fn accounts(&self) -> Vec<(AccountId, &InvestmentAccount)>;

    fn insert_account(&mut self, account: InvestmentAccount) -> Result<AccountId, StoreError>;

    fn delete_account(&mut self, id: AccountId) -> Result<InvestmentAccount, StoreError>;
}

pub trait SecurityRepository: IdentifierSource {
    fn security(&self, id: SecurityId) -> Option<&Security>;

    fn find_security(&self, ticker: &str) -> Option<SecurityId>;

    fn securities(&self) -> Vec<(SecurityId, &Security)>;

    fn insert_security(&mut self, security: Security) -> Result<SecurityId, StoreError>;

    fn update_security(&mut self, id: SecurityId, security: Security) -> Result<(), StoreError>;

    fn delete_security(&mut self, id: SecurityId) -> Result<Security, StoreError>;
}

pub trait TransactionRepository {
    fn has_transactions_on(&self, account: AccountId, date: NaiveDate) -> bool;

    fn transactions(&self) -> &[Transaction];

    fn insert_transaction(&mut self, transaction: Transaction) -> Result<(), StoreError>;

    fn ticker_history(&self) -> &[TickerHistory];

    fn insert_ticker_history(&mut self, history: TickerHistory) -> Result<(), StoreError>;
}

pub trait PositionRepository {
    fn positions(&self) -> &[Position];

    fn insert_position(&mut self, position: Position) -> Result<(), StoreError>;

    fn closed_positions(&self) -> &[ClosedPosition];

    fn insert_closed_position(&mut self, position: ClosedPosition) -> Result<(), StoreError>;
}

pub trait RealEstateRepository {
    fn real_estate(&self, address: Address) -> Option<&RealEstate>;

    fn insert_real_estate(&mut self, real_estate: RealEstate) -> Result<(), StoreError>;

    fn property_value(&self, id: PropertyId) -> Option<&RealPropertyValue>;

    fn property_values(&self) -> Vec<(PropertyId, &RealPropertyValue)>;

    fn insert_property_value(&mut self, value: RealPropertyValue)
        -> Result<PropertyId, StoreError>;

    fn delete_property_value(&mut self, id: PropertyId) -> Result<RealPropertyValue, StoreError>;

    fn service_provider(&self, provider: Provider) -> Option<&ServiceProvider>;

    fn insert_service_provider(&mut self, provider: ServiceProvider) -> Result<(), StoreError>;
}

pub trait BillRepository {
    fn bill(&self, id: BillId) -> Option<&Bill>;

    fn bills(&self) -> Vec<(BillId, &Bill)>;

    fn insert_bill(&mut self, bill: Bill) -> Result<BillId, StoreError>;

    /// Replace a stored bill with one of the same kind, returning the old one.
    fn replace_bill(&mut self, id: BillId, bill: Bill) -> Result<Bill, StoreError>;

    /// The complex bill of `kind` for a property with the given start date.
    fn find_complex_bill(
        &self,
        kind: BillKind,
        real_estate: Address,
        start_date: NaiveDate,
        is_actual: bool,
    ) -> Option<BillId>;

    /// Sum of the depreciation bills of a property before `tax_year`.
    fn depreciation_before(&self, property: PropertyId, tax_year: i32) -> Decimal;
}

pub trait UtilityDataRepository {
    fn electric_data(&self, real_estate: Address, month: YearMonth) -> Option<&ElectricData>;

    fn insert_electric_data(&mut self, data: ElectricData) -> Result<(), StoreError>;

    fn natgas_data(&self, real_estate: Address, month: YearMonth) -> Option<&NatGasData>;

    fn insert_natgas_data(&mut self, data: NatGasData) -> Result<(), StoreError>;
}

pub trait NewsRepository {
    fn news(&self) -> &[NewsSentiment];

    fn insert_news(&mut self, news: NewsSentiment) -> Result<(), StoreError>;
}

/// A [`MemoryStore`] persisted as a JSON file.
pub struct Store {
    path: PathBuf,
    data: MemoryStore,
}

impl Store {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let data = if path.exists() {
            let file = File::open(path).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            log::debug!("store {} does not exist, starting empty", path.display());
            MemoryStore::default()
        };
        Ok(Store {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(io_err)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.data).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        log::debug!("saved store to {}", self.path.display());
        Ok(())
    }

    pub fn data(&self) -> &MemoryStore {
        &self.data
    }

    /// Run `f` against a staged copy of the data, replacing the live data
    /// only when it succeeds. Nothing is written on error.
    pub fn atomic<T, E>(
        &mut self,
        f: impl FnOnce(&mut MemoryStore) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut staged = self.data.clone();
        let result = f(&mut staged)?;
        self.data = staged;
        Ok(result)
    }
}

/// Change the asset class of a security, regenerating its identifier when the
/// class changed.
pub fn convert_security<S: SecurityRepository>(
    store: &mut S,
    id: SecurityId,
    class: AssetClass,
    subclass: AssetSubclass,
) -> Result<Security, StoreError> {
    let mut security = store
        .security(id)
        .cloned()
        .ok_or_else(|| StoreError::not_found("security", id))?;
    if security.asset_class != class {
        let identifier = generate_id(&*store, class)?;
        log::info!(
            "converting {} from {} to {}: {} -> {}",
            security.ticker,
            security.asset_class,
            class,
            security.identifier,
            identifier
        );
        security.identifier = identifier;
    }
    security.asset_class = class;
    security.asset_subclass = subclass;
    store.update_security(id, security.clone())?;
    Ok(security)
}
