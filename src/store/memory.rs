use super::{
    AccountRepository, BillRepository, NewsRepository, PositionRepository, RealEstateRepository,
    SecurityRepository, StoreError, TransactionRepository, UtilityDataRepository,
};
use crate::core::{Address, IdentifierSource, Provider};
use crate::models::{
    AccountId, Bill, BillId, BillKind, ClosedPosition, ElectricData, InvestmentAccount,
    NatGasData, NewsSentiment, Position, PropertyId, RealEstate, RealPropertyValue, Security,
    SecurityId, ServiceProvider, TickerHistory, Transaction, YearMonth,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-memory relational store. Cloning it gives the staged copy used by
/// [`Store::atomic`](super::Store::atomic).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    last_id: u64,
    accounts: BTreeMap<AccountId, InvestmentAccount>,
    securities: BTreeMap<SecurityId, Security>,
    positions: Vec<Position>,
    closed_positions: Vec<ClosedPosition>,
    transactions: Vec<Transaction>,
    ticker_history: Vec<TickerHistory>,
    real_estate: BTreeMap<Address, RealEstate>,
    property_values: BTreeMap<PropertyId, RealPropertyValue>,
    service_providers: BTreeMap<Provider, ServiceProvider>,
    bills: BTreeMap<BillId, Bill>,
    electric_data: Vec<ElectricData>,
    natgas_data: Vec<NatGasData>,
    news: Vec<NewsSentiment>,
}

impl MemoryStore {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_account(&self, id: AccountId) -> Result<&InvestmentAccount, StoreError> {
        self.accounts
            .get(&id)
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    fn require_security(&self, id: SecurityId) -> Result<&Security, StoreError> {
        self.securities
            .get(&id)
            .ok_or_else(|| StoreError::not_found("security", id))
    }

    fn require_real_estate(&self, address: Address) -> Result<&RealEstate, StoreError> {
        self.real_estate
            .get(&address)
            .ok_or_else(|| StoreError::not_found("real estate", address))
    }

    /// Validation, reference and uniqueness checks for a bill stored under
    /// any id other than `skip`.
    fn check_bill(&self, bill: &Bill, skip: Option<BillId>) -> Result<(), StoreError> {
        bill.validate()?;
        let base = bill.base();
        self.require_real_estate(base.real_estate)?;
        if self.service_provider(base.service_provider).is_none() {
            return Err(StoreError::not_found(
                "service provider",
                base.service_provider,
            ));
        }
        if let Bill::Depreciation(data) = bill {
            if self.property_value(data.real_property_value).is_none() {
                return Err(StoreError::not_found(
                    "real property value",
                    data.real_property_value,
                ));
            }
        }
        if let Some(key) = self.bill_conflict(bill, skip) {
            return Err(StoreError::duplicate("bill", key));
        }
        Ok(())
    }

    /// Natural key of a bill, unique within its kind.
    fn bill_conflict(&self, bill: &Bill, skip: Option<BillId>) -> Option<String> {
        let base = bill.base();
        let kind = bill.kind();
        let candidates = self
            .bills
            .iter()
            .filter(|(id, b)| Some(**id) != skip && b.kind() == kind);
        candidates.map(|(_, b)| b).find_map(|other| {
            let other_base = other.base();
            if other_base.real_estate != base.real_estate {
                return None;
            }
            // Depreciation bills are per depreciable item.
            if let (Bill::Depreciation(a), Bill::Depreciation(b)) = (bill, other) {
                if a.real_property_value != b.real_property_value {
                    return None;
                }
            }
            match (bill.is_actual(), other.is_actual()) {
                (Some(actual), Some(other_actual)) if actual == other_actual => {
                    if other_base.start_date == base.start_date {
                        Some(format!(
                            "{kind} {} start {} actual={actual}",
                            base.real_estate, base.start_date
                        ))
                    } else if other_base.end_date == base.end_date {
                        Some(format!(
                            "{kind} {} end {} actual={actual}",
                            base.real_estate, base.end_date
                        ))
                    } else {
                        None
                    }
                }
                (None, None)
                    if other_base.service_provider == base.service_provider
                        && other_base.start_date == base.start_date
                        && other_base.end_date == base.end_date =>
                {
                    Some(format!(
                        "{kind} {} {} {} to {}",
                        base.real_estate, base.service_provider, base.start_date, base.end_date
                    ))
                }
                _ => None,
            }
        })
    }
}

impl IdentifierSource for MemoryStore {
    fn max_identifier(&self, prefix: &str) -> Option<String> {
        self.securities
            .values()
            .map(|s| &s.identifier)
            .filter(|id| id.starts_with(prefix))
            .max()
            .cloned()
    }
}

impl AccountRepository for MemoryStore {
    fn account(&self, id: AccountId) -> Option<&InvestmentAccount> {
        self.accounts.get(&id)
    }

    fn find_account(&self, broker: &str, account_id: &str) -> Option<AccountId> {
        self.accounts
            .iter()
            .find(|(_, a)| a.broker == broker && a.account_id == account_id)
            .map(|(id, _)| *id)
    }

    fn accounts(&self) -> Vec<(AccountId, &InvestmentAccount)> {
        self.accounts.iter().map(|(id, a)| (*id, a)).collect()
    }

    fn insert_account(&mut self, account: InvestmentAccount) -> Result<AccountId, StoreError> {
        if self
            .find_account(&account.broker, &account.account_id)
            .is_some()
        {
            return Err(StoreError::duplicate(
                "account",
                format!("{} {}", account.broker, account.account_id),
            ));
        }
        let id = AccountId(self.next_id());
        self.accounts.insert(id, account);
        Ok(id)
    }

    fn delete_account(&mut self, id: AccountId) -> Result<InvestmentAccount, StoreError> {
        self.require_account(id)?;
        let referenced_by = if self.positions.iter().any(|p| p.account == id) {
            Some("positions")
        } else if self.closed_positions.iter().any(|p| p.account == id) {
            Some("closed positions")
        } else if self.transactions.iter().any(|t| t.account == id) {
            Some("transactions")
        } else {
            None
        };
        if let Some(referenced_by) = referenced_by {
            return Err(StoreError::Protected {
                entity: "account",
                key: id.to_string(),
                referenced_by,
            });
        }
        self.accounts
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("account", id))
    }
}

impl SecurityRepository for MemoryStore {
    fn security(&self, id: SecurityId) -> Option<&Security> {
        self.securities.get(&id)
    }

    fn find_security(&self, ticker: &str) -> Option<SecurityId> {
        self.securities
            .iter()
            .find(|(_, s)| s.ticker == ticker)
            .map(|(id, _)| *id)
    }

    fn securities(&self) -> Vec<(SecurityId, &Security)> {
        self.securities.iter().map(|(id, s)| (*id, s)).collect()
    }

    fn insert_security(&mut self, security: Security) -> Result<SecurityId, StoreError> {
        security.validate()?;
        if self.find_security(&security.ticker).is_some() {
            return Err(StoreError::duplicate("security ticker", &security.ticker));
        }
        if self
            .securities
            .values()
            .any(|s| s.identifier == security.identifier)
        {
            return Err(StoreError::duplicate(
                "security identifier",
                &security.identifier,
            ));
        }
        let id = SecurityId(self.next_id());
        self.securities.insert(id, security);
        Ok(id)
    }

    fn update_security(&mut self, id: SecurityId, security: Security) -> Result<(), StoreError> {
        security.validate()?;
        self.require_security(id)?;
        let clash = self.securities.iter().find(|(other, s)| {
            **other != id && (s.ticker == security.ticker || s.identifier == security.identifier)
        });
        if let Some((_, s)) = clash {
            return Err(StoreError::duplicate("security", &s.ticker));
        }
        self.securities.insert(id, security);
        Ok(())
    }

    fn delete_security(&mut self, id: SecurityId) -> Result<Security, StoreError> {
        self.require_security(id)?;
        let referenced_by = if self.positions.iter().any(|p| p.security == id) {
            Some("positions")
        } else if self.closed_positions.iter().any(|p| p.security == id) {
            Some("closed positions")
        } else if self.transactions.iter().any(|t| t.security == Some(id)) {
            Some("transactions")
        } else {
            None
        };
        if let Some(referenced_by) = referenced_by {
            return Err(StoreError::Protected {
                entity: "security",
                key: id.to_string(),
                referenced_by,
            });
        }
        self.securities
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("security", id))
    }
}

impl TransactionRepository for MemoryStore {
    fn has_transactions_on(&self, account: AccountId, date: NaiveDate) -> bool {
        self.transactions
            .iter()
            .any(|t| t.account == account && t.date == date)
    }

    fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    fn insert_transaction(&mut self, transaction: Transaction) -> Result<(), StoreError> {
        transaction.validate()?;
        self.require_account(transaction.account)?;
        if let Some(security) = transaction.security {
            self.require_security(security)?;
        }
        self.transactions.push(transaction);
        Ok(())
    }

    fn ticker_history(&self) -> &[TickerHistory] {
        &self.ticker_history
    }

    fn insert_ticker_history(&mut self, history: TickerHistory) -> Result<(), StoreError> {
        if self
            .ticker_history
            .iter()
            .any(|h| h.old_ticker == history.old_ticker && h.new_ticker == history.new_ticker)
        {
            return Err(StoreError::duplicate(
                "ticker history",
                format!("{} -> {}", history.old_ticker, history.new_ticker),
            ));
        }
        self.ticker_history.push(history);
        Ok(())
    }
}

impl PositionRepository for MemoryStore {
    fn positions(&self) -> &[Position] {
        &self.positions
    }

    fn insert_position(&mut self, position: Position) -> Result<(), StoreError> {
        self.require_account(position.account)?;
        self.require_security(position.security)?;
        if self.positions.iter().any(|p| {
            p.account == position.account
                && p.security == position.security
                && p.as_of_date == position.as_of_date
        }) {
            return Err(StoreError::duplicate(
                "position",
                format!(
                    "account {} security {} on {}",
                    position.account, position.security, position.as_of_date
                ),
            ));
        }
        self.positions.push(position);
        Ok(())
    }

    fn closed_positions(&self) -> &[ClosedPosition] {
        &self.closed_positions
    }

    fn insert_closed_position(&mut self, position: ClosedPosition) -> Result<(), StoreError> {
        let account = self.require_account(position.account)?;
        position.validate(account)?;
        self.require_security(position.security)?;
        self.closed_positions.push(position);
        Ok(())
    }
}

impl RealEstateRepository for MemoryStore {
    fn real_estate(&self, address: Address) -> Option<&RealEstate> {
        self.real_estate.get(&address)
    }

    fn insert_real_estate(&mut self, real_estate: RealEstate) -> Result<(), StoreError> {
        if self.real_estate.contains_key(&real_estate.address) {
            return Err(StoreError::duplicate("real estate", real_estate.address));
        }
        self.real_estate.insert(real_estate.address, real_estate);
        Ok(())
    }

    fn property_value(&self, id: PropertyId) -> Option<&RealPropertyValue> {
        self.property_values.get(&id)
    }

    fn property_values(&self) -> Vec<(PropertyId, &RealPropertyValue)> {
        self.property_values.iter().map(|(id, v)| (*id, v)).collect()
    }

    fn insert_property_value(
        &mut self,
        value: RealPropertyValue,
    ) -> Result<PropertyId, StoreError> {
        value.validate()?;
        self.require_real_estate(value.real_estate)?;
        if self.property_values.values().any(|v| {
            v.real_estate == value.real_estate
                && v.item == value.item
                && v.purchase_date == value.purchase_date
        }) {
            return Err(StoreError::duplicate(
                "real property value",
                format!("{} {} {}", value.real_estate, value.item, value.purchase_date),
            ));
        }
        let id = PropertyId(self.next_id());
        self.property_values.insert(id, value);
        Ok(id)
    }

    fn delete_property_value(&mut self, id: PropertyId) -> Result<RealPropertyValue, StoreError> {
        let referenced = self.bills.values().any(|b| match b {
            Bill::Depreciation(d) => d.real_property_value == id,
            _ => false,
        });
        if referenced {
            return Err(StoreError::Protected {
                entity: "real property value",
                key: id.to_string(),
                referenced_by: "depreciation bills",
            });
        }
        self.property_values
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("real property value", id))
    }

    fn service_provider(&self, provider: Provider) -> Option<&ServiceProvider> {
        self.service_providers.get(&provider)
    }

    fn insert_service_provider(&mut self, provider: ServiceProvider) -> Result<(), StoreError> {
        if self.service_providers.contains_key(&provider.provider) {
            return Err(StoreError::duplicate("service provider", provider.provider));
        }
        self.service_providers.insert(provider.provider, provider);
        Ok(())
    }
}

impl BillRepository for MemoryStore {
    fn bill(&self, id: BillId) -> Option<&Bill> {
        self.bills.get(&id)
    }

    fn bills(&self) -> Vec<(BillId, &Bill)> {
        self.bills.iter().map(|(id, b)| (*id, b)).collect()
    }

    fn insert_bill(&mut self, bill: Bill) -> Result<BillId, StoreError> {
        self.check_bill(&bill, None)?;
        let id = BillId(self.next_id());
        self.bills.insert(id, bill);
        Ok(id)
    }

    fn replace_bill(&mut self, id: BillId, bill: Bill) -> Result<Bill, StoreError> {
        let current = self
            .bills
            .get(&id)
            .ok_or_else(|| StoreError::not_found("bill", id))?;
        if current.kind() != bill.kind() {
            return Err(StoreError::not_found("bill", format!("{id} of kind {}", bill.kind())));
        }
        self.check_bill(&bill, Some(id))?;
        Ok(std::mem::replace(
            self.bills.get_mut(&id).ok_or_else(|| StoreError::not_found("bill", id))?,
            bill,
        ))
    }

    fn find_complex_bill(
        &self,
        kind: BillKind,
        real_estate: Address,
        start_date: NaiveDate,
        is_actual: bool,
    ) -> Option<BillId> {
        self.bills
            .iter()
            .find(|(_, b)| {
                b.kind() == kind
                    && b.is_actual() == Some(is_actual)
                    && b.base().real_estate == real_estate
                    && b.base().start_date == start_date
            })
            .map(|(id, _)| *id)
    }

    fn depreciation_before(&self, property: PropertyId, tax_year: i32) -> Decimal {
        self.bills
            .values()
            .filter_map(|b| match b {
                Bill::Depreciation(d)
                    if d.real_property_value == property && d.tax_year() < tax_year =>
                {
                    Some(d.base.total_cost)
                }
                _ => None,
            })
            .sum()
    }
}

impl UtilityDataRepository for MemoryStore {
    fn electric_data(&self, real_estate: Address, month: YearMonth) -> Option<&ElectricData> {
        self.electric_data
            .iter()
            .find(|d| d.real_estate == real_estate && d.month == month)
    }

    fn insert_electric_data(&mut self, data: ElectricData) -> Result<(), StoreError> {
        self.require_real_estate(data.real_estate)?;
        if self.electric_data(data.real_estate, data.month).is_some() {
            return Err(StoreError::duplicate(
                "electric data",
                format!("{} {}", data.real_estate, data.month),
            ));
        }
        self.electric_data.push(data);
        Ok(())
    }

    fn natgas_data(&self, real_estate: Address, month: YearMonth) -> Option<&NatGasData> {
        self.natgas_data
            .iter()
            .find(|d| d.real_estate == real_estate && d.month == month)
    }

    fn insert_natgas_data(&mut self, data: NatGasData) -> Result<(), StoreError> {
        self.require_real_estate(data.real_estate)?;
        if self.natgas_data(data.real_estate, data.month).is_some() {
            return Err(StoreError::duplicate(
                "natural gas data",
                format!("{} {}", data.real_estate, data.month),
            ));
        }
        self.natgas_data.push(data);
        Ok(())
    }
}

impl NewsRepository for MemoryStore {
    fn news(&self) -> &[NewsSentiment] {
        &self.news
    }

    fn insert_news(&mut self, news: NewsSentiment) -> Result<(), StoreError> {
        news.validate()?;
        if self
            .news
            .iter()
            .any(|n| n.ticker == news.ticker && n.url == news.url)
        {
            return Err(StoreError::duplicate(
                "news sentiment",
                format!("{} {}", news.ticker, news.url),
            ));
        }
        self.news.push(news);
        Ok(())
    }
}
