//! Init command - create the store and load reference data

use super::Context;
use crate::core::Provider;
use crate::models::{InvestmentAccount, RealEstate, RealPropertyValue, ServiceProvider};
use crate::store::{AccountRepository, MemoryStore, RealEstateRepository, StoreError};
use anyhow::Context as _;
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitCommand {
    /// JSON file with accounts, real estate, service providers and property values
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Replace an existing store file
    #[arg(long)]
    force: bool,
}

/// Reference data loaded by `init --seed`. Service providers default to every
/// known provider with its default tax category.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub accounts: Vec<InvestmentAccount>,
    pub real_estate: Vec<RealEstate>,
    pub service_providers: Vec<ServiceProvider>,
    pub property_values: Vec<RealPropertyValue>,
}

impl Seed {
    pub fn load(&self, store: &mut MemoryStore) -> Result<(), StoreError> {
        let providers: Vec<ServiceProvider> = if self.service_providers.is_empty() {
            Provider::ALL.into_iter().map(ServiceProvider::from).collect()
        } else {
            self.service_providers.clone()
        };
        for provider in providers {
            store.insert_service_provider(provider)?;
        }
        for real_estate in &self.real_estate {
            store.insert_real_estate(real_estate.clone())?;
        }
        for value in &self.property_values {
            store.insert_property_value(value.clone())?;
        }
        for account in &self.accounts {
            store.insert_account(account.clone())?;
        }
        Ok(())
    }
}

impl InitCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        if ctx.store.exists() && !self.force {
            anyhow::bail!(
                "store {} already exists, pass --force to replace it",
                ctx.store.display()
            );
        }
        let seed = match &self.seed {
            Some(path) => serde_json::from_str(&super::read_input(path)?)
                .with_context(|| format!("invalid seed file {}", path.display()))?,
            None => Seed::default(),
        };

        if ctx.store.exists() {
            log::warn!("replacing store {}", ctx.store.display());
            std::fs::remove_file(&ctx.store)
                .with_context(|| format!("failed to remove {}", ctx.store.display()))?;
        }
        let mut store = ctx.open_store()?;
        store.atomic(|data| seed.load(data))?;
        store.save()?;
        println!(
            "Initialised {} with {} accounts, {} properties, {} property values",
            ctx.store.display(),
            seed.accounts.len(),
            seed.real_estate.len(),
            seed.property_values.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_registers_default_providers() {
        let seed: Seed = serde_json::from_str(
            r#"{
                "real_estate": [{
                    "address": "BirchLane",
                    "units": 2,
                    "square_feet": 2100,
                    "purchase_date": "2019-05-01",
                    "bill_tax_related": true
                }],
                "accounts": [{
                    "broker": "Fidelity",
                    "account_id": "Z12345678",
                    "account_name": "Individual",
                    "taxable": true,
                    "create_date": "2020-01-01"
                }]
            }"#,
        )
        .unwrap();
        let mut store = MemoryStore::default();
        seed.load(&mut store).unwrap();

        assert!(store.service_provider(Provider::WellsFargo).is_some());
        assert!(store.real_estate(crate::core::Address::BirchLane).is_some());
        assert!(store.find_account("Fidelity", "Z12345678").is_some());
    }
}
