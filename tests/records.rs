//! Import, estimate and report flows against an in-memory store

use calamine::{open_workbook, Reader, Xlsx};
use chrono::NaiveDate;
use homebooks::calc::estimator::create_electric_estimate;
use homebooks::cmd::init::Seed;
use homebooks::core::{ActionType, Address};
use homebooks::importers::{fidelity, pseg_electric, rates, templates};
use homebooks::models::{Bill, BillRecord};
use homebooks::report::{write_workbook, Report, SHEET_NAMES};
use homebooks::store::{
    BillRepository, MemoryStore, PositionRepository, SecurityRepository, Store,
    TransactionRepository,
};
use rust_decimal_macros::dec;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/data/{name}")).expect("fixture exists")
}

fn seeded() -> MemoryStore {
    let seed: Seed = serde_json::from_str(&fixture("seed.json")).unwrap();
    let mut store = MemoryStore::default();
    seed.load(&mut store).unwrap();
    store
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn closed_positions_expand_into_lots() {
    let mut store = seeded();
    let result = fidelity::closed_positions::import(
        &mut store,
        &fixture("fidelity_closed_positions.csv"),
        "gains.csv",
    )
    .unwrap();

    assert_eq!(result.positions.len(), 4);
    assert_eq!(store.closed_positions().len(), 4);
    let tickers: Vec<_> = result.new_securities.iter().map(|s| &s.ticker).collect();
    assert_eq!(tickers, vec!["AAPL", "MSFT"]);

    let small_lot = &result.positions[0];
    assert_eq!(small_lot.quantity, dec!(0.23));
    assert_eq!(small_lot.date_acquired, date(2023, 6, 1));
    assert_eq!(small_lot.proceeds_total, dec!(13.19));
    assert_eq!(small_lot.cost_basis_total, dec!(13.19));
    assert_eq!(small_lot.long_term_pnl, dec!(0));

    // The disallowed loss moves into the cost basis and out of the gain.
    let wash_lot = &result.positions[2];
    assert_eq!(wash_lot.cost_basis_total, dec!(671.20));
    assert_eq!(wash_lot.cost_basis_total_unadj, dec!(700.00));
    assert_eq!(wash_lot.short_term_pnl, dec!(0));
    assert_eq!(wash_lot.short_term_pnl_unadj, dec!(-28.80));
    assert_eq!(wash_lot.wash_sale_disallowed, dec!(28.80));

    assert_eq!(result.positions[3].long_term_pnl, dec!(105.60));
}

#[test]
fn transaction_history_imports_once() {
    let mut store = seeded();
    let history = fixture("fidelity_history.csv");

    let first = fidelity::transactions::import(&mut store, &history, "history.csv").unwrap();
    assert_eq!(first.transactions.len(), 4);
    assert_eq!(first.new_securities.len(), 4);
    assert!(first.skipped.is_empty());

    let second = fidelity::transactions::import(&mut store, &history, "history.csv").unwrap();
    assert!(second.transactions.is_empty());
    assert!(second.new_securities.is_empty());
    assert_eq!(second.skipped.len(), 3);
    assert_eq!(store.transactions().len(), 4);
    assert_eq!(store.securities().len(), 4);
}

#[test]
fn electric_estimate_from_statement_and_rate_table() {
    let mut store = seeded();
    rates::import_electric_rates(&mut store, &fixture("electric_rates.csv")).unwrap();
    let actual = pseg_electric::parse_text(&fixture("pseg_electric_2024_06.txt"), "pseg.pdf")
        .unwrap()
        .into_bill();
    let actual_id = store.insert_bill(actual).unwrap();

    let id = create_electric_estimate(&mut store, actual_id, dec!(300)).unwrap();
    let Some(Bill::Electric(estimate)) = store.bill(id) else {
        panic!("estimate {id} is not an electric bill");
    };
    assert!(!estimate.is_actual);
    assert_eq!(estimate.total_kwh, dec!(846));
    assert_eq!(estimate.delivery_cost, dec!(85.93));
    assert_eq!(estimate.supply_cost, dec!(123.60));
    assert_eq!(estimate.base.total_cost, dec!(209.53));
    assert_eq!(estimate.base.paid_date, None);
    assert_eq!(
        store.bill(actual_id).unwrap().base().total_cost,
        dec!(127.64)
    );
}

#[test]
fn report_workbook_covers_every_section() {
    let mut store = seeded();
    fidelity::closed_positions::import(
        &mut store,
        &fixture("fidelity_closed_positions.csv"),
        "gains.csv",
    )
    .unwrap();
    fidelity::transactions::import(&mut store, &fixture("fidelity_history.csv"), "history.csv")
        .unwrap();
    templates::import_simple_bills(&mut store, &fixture("simple_bills.csv"), "bills.csv").unwrap();

    let report = Report::build(&store, Some(2023));
    assert_eq!(report.bills.len(), 3);
    assert_eq!(report.realized_pnl.len(), 1);
    let pnl = &report.realized_pnl[0];
    assert_eq!(pnl.account, "Z12345678");
    assert_eq!(pnl.short_term, dec!(0));
    assert_eq!(pnl.short_term_unadj, dec!(-28.80));
    assert_eq!(pnl.long_term, dec!(122.95));
    assert_eq!(pnl.wash_sale_disallowed, dec!(28.80));

    let dividends = report
        .income
        .iter()
        .find(|row| row.action_type == ActionType::DividendReceived)
        .unwrap();
    assert_eq!(dividends.amount, dec!(44.50));

    // Only the Birch Lane water bill defaults to tax related.
    let water = report
        .providers
        .iter()
        .find(|row| row.bills == 2)
        .unwrap();
    assert_eq!(water.total_cost, dec!(105.10));
    assert_eq!(water.tax_related_cost, dec!(60.00));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("2023.xlsx");
    write_workbook(&report, &path).unwrap();
    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names(), SHEET_NAMES.map(String::from).to_vec());
}

#[test]
fn store_snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut store = Store::open(&path).unwrap();
    store
        .atomic(|data| {
            let seed: Seed = serde_json::from_str(&fixture("seed.json"))?;
            seed.load(data)?;
            templates::import_simple_bills(data, &fixture("simple_bills.csv"), "bills.csv")?;
            anyhow::Ok(())
        })
        .unwrap();
    store.save().unwrap();

    let reopened = Store::open(&path).unwrap();
    let bills = reopened.data().bills();
    assert_eq!(bills.len(), 3);
    let premium = bills
        .iter()
        .find(|(_, bill)| bill.base().total_cost == dec!(1200.00))
        .unwrap();
    assert_eq!(premium.1.base().real_estate, Address::ElmStreet);
    assert_eq!(premium.1.base().notes.as_deref(), Some("annual premium"));

    // A failed import leaves the snapshot untouched.
    let mut store = Store::open(&path).unwrap();
    let broken = fixture("simple_bills.csv").replace("StateFarm", "NoSuchProvider");
    assert!(store
        .atomic(|data| templates::import_simple_bills(data, &broken, "bills.csv"))
        .is_err());
    assert_eq!(store.data().bills().len(), 3);
}
