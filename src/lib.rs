//! Brokerage, utility and rental property record keeping: statement
//! importers, a relational store persisted as JSON, depreciation and utility
//! bill calculators, AlphaVantage market data and XLSX reports.

pub mod calc;
pub mod cmd;
pub mod core;
pub mod importers;
pub mod market_data;
pub mod models;
pub mod report;
pub mod store;
