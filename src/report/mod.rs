//! Read-only aggregations over the store: bill totals by tax category, month
//! and provider, realized pnl per account and year, and investment income.

mod workbook;

pub use workbook::{write_workbook, SHEET_NAMES};

use crate::core::{ActionType, Address, Provider, TaxCategory};
use crate::models::{BillId, BillKind, YearMonth};
use crate::store::{
    AccountRepository, BillRepository, PositionRepository, RealEstateRepository,
    TransactionRepository,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tabled::Tabled;

fn display_option<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(String::new, ToString::to_string)
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct TaxCategoryTotal {
    pub real_estate: Address,
    pub tax_category: TaxCategory,
    pub total_cost: Decimal,
    pub tax_related_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub provider: Provider,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct ProviderTotal {
    pub provider: Provider,
    pub bills: usize,
    pub total_cost: Decimal,
    pub tax_related_cost: Decimal,
}

/// One bill as listed on the `Bills` sheet.
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct BillRow {
    pub id: BillId,
    pub kind: BillKind,
    pub real_estate: Address,
    pub provider: Provider,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: Decimal,
    pub tax_related_cost: Decimal,
    #[tabled(display = "display_option")]
    pub paid_date: Option<NaiveDate>,
    #[tabled(skip)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct RealizedPnl {
    pub account: String,
    pub year: i32,
    pub short_term: Decimal,
    pub long_term: Decimal,
    pub short_term_unadj: Decimal,
    pub long_term_unadj: Decimal,
    pub wash_sale_disallowed: Decimal,
}

impl RealizedPnl {
    pub fn total(&self) -> Decimal {
        self.short_term + self.long_term
    }
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct IncomeTotal {
    pub account: String,
    pub action_type: ActionType,
    pub amount: Decimal,
}

/// Everything the report command prints and writes to the workbook. Bills
/// are selected by the year of their end date, closed positions by the year
/// sold and income by the transaction date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub year: Option<i32>,
    pub tax_categories: Vec<TaxCategoryTotal>,
    pub monthly: Vec<MonthlyTotal>,
    pub providers: Vec<ProviderTotal>,
    pub bills: Vec<BillRow>,
    pub realized_pnl: Vec<RealizedPnl>,
    pub income: Vec<IncomeTotal>,
}

impl Report {
    pub fn build<S>(store: &S, year: Option<i32>) -> Report
    where
        S: AccountRepository
            + BillRepository
            + RealEstateRepository
            + PositionRepository
            + TransactionRepository,
    {
        let bills = bill_rows(store, year);
        Report {
            year,
            tax_categories: tax_category_totals(store, &bills),
            monthly: monthly_totals(&bills),
            providers: provider_totals(&bills),
            realized_pnl: realized_pnl(store, year),
            income: income_totals(store, year),
            bills,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bills.is_empty() && self.realized_pnl.is_empty() && self.income.is_empty()
    }
}

fn in_year(year: Option<i32>, date: NaiveDate) -> bool {
    year.map_or(true, |y| date.year() == y)
}

fn account_name<S: AccountRepository>(store: &S, id: crate::models::AccountId) -> String {
    store
        .account(id)
        .map_or_else(|| id.to_string(), |a| a.account_id.clone())
}

pub fn bill_rows<S: BillRepository>(store: &S, year: Option<i32>) -> Vec<BillRow> {
    let mut rows: Vec<BillRow> = store
        .bills()
        .into_iter()
        .filter(|(_, bill)| in_year(year, bill.base().end_date))
        .map(|(id, bill)| {
            let base = bill.base();
            BillRow {
                id,
                kind: bill.kind(),
                real_estate: base.real_estate,
                provider: base.service_provider,
                start_date: base.start_date,
                end_date: base.end_date,
                total_cost: base.total_cost,
                tax_related_cost: base.tax_related_cost,
                paid_date: base.paid_date,
                notes: base.notes.clone(),
            }
        })
        .collect();
    rows.sort_by_key(|r| (r.end_date, r.real_estate, r.provider, r.id));
    rows
}

/// Totals by property and the tax category of the bill's provider. Providers
/// without a stored row fall back to their default category.
pub fn tax_category_totals<S: RealEstateRepository>(
    store: &S,
    bills: &[BillRow],
) -> Vec<TaxCategoryTotal> {
    let mut totals: BTreeMap<(Address, TaxCategory), (Decimal, Decimal)> = BTreeMap::new();
    for bill in bills {
        let category = store
            .service_provider(bill.provider)
            .map_or_else(|| bill.provider.default_tax_category(), |sp| sp.tax_category);
        let entry = totals.entry((bill.real_estate, category)).or_default();
        entry.0 += bill.total_cost;
        entry.1 += bill.tax_related_cost;
    }
    totals
        .into_iter()
        .map(|((real_estate, tax_category), (total_cost, tax_related_cost))| TaxCategoryTotal {
            real_estate,
            tax_category,
            total_cost,
            tax_related_cost,
        })
        .collect()
}

pub fn monthly_totals(bills: &[BillRow]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<(YearMonth, Provider), Decimal> = BTreeMap::new();
    for bill in bills {
        *totals
            .entry((YearMonth::of(bill.end_date), bill.provider))
            .or_default() += bill.total_cost;
    }
    totals
        .into_iter()
        .map(|((month, provider), total_cost)| MonthlyTotal {
            month,
            provider,
            total_cost,
        })
        .collect()
}

pub fn provider_totals(bills: &[BillRow]) -> Vec<ProviderTotal> {
    let mut totals: BTreeMap<Provider, ProviderTotal> = BTreeMap::new();
    for bill in bills {
        let entry = totals.entry(bill.provider).or_insert(ProviderTotal {
            provider: bill.provider,
            bills: 0,
            total_cost: Decimal::ZERO,
            tax_related_cost: Decimal::ZERO,
        });
        entry.bills += 1;
        entry.total_cost += bill.total_cost;
        entry.tax_related_cost += bill.tax_related_cost;
    }
    totals.into_values().collect()
}

pub fn realized_pnl<S>(store: &S, year: Option<i32>) -> Vec<RealizedPnl>
where
    S: AccountRepository + PositionRepository,
{
    let mut totals: BTreeMap<(String, i32), RealizedPnl> = BTreeMap::new();
    for position in store
        .closed_positions()
        .iter()
        .filter(|p| in_year(year, p.date_sold))
    {
        let account = account_name(store, position.account);
        let sold = position.date_sold.year();
        let entry = totals
            .entry((account.clone(), sold))
            .or_insert_with(|| RealizedPnl {
                account,
                year: sold,
                short_term: Decimal::ZERO,
                long_term: Decimal::ZERO,
                short_term_unadj: Decimal::ZERO,
                long_term_unadj: Decimal::ZERO,
                wash_sale_disallowed: Decimal::ZERO,
            });
        entry.short_term += position.short_term_pnl;
        entry.long_term += position.long_term_pnl;
        entry.short_term_unadj += position.short_term_pnl_unadj;
        entry.long_term_unadj += position.long_term_pnl_unadj;
        entry.wash_sale_disallowed += position.wash_sale_disallowed;
    }
    totals.into_values().collect()
}

/// Dividend and interest transactions summed per account and action.
pub fn income_totals<S>(store: &S, year: Option<i32>) -> Vec<IncomeTotal>
where
    S: AccountRepository + TransactionRepository,
{
    let mut totals: BTreeMap<(String, ActionType), Decimal> = BTreeMap::new();
    for transaction in store
        .transactions()
        .iter()
        .filter(|t| t.transaction_type.is_income() && in_year(year, t.date))
    {
        *totals
            .entry((account_name(store, transaction.account), transaction.action_type))
            .or_default() += transaction.net_amount;
    }
    totals
        .into_iter()
        .map(|((account, action_type), amount)| IncomeTotal {
            account,
            action_type,
            amount,
        })
        .collect()
}
