//! Security command - list securities and reclassify placeholders

use super::{print_table, Context};
use crate::core::{AssetClass, AssetSubclass};
use crate::store::{convert_security, SecurityRepository};
use clap::{Args, Subcommand};
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct SecurityCommand {
    #[command(subcommand)]
    action: SecurityAction,
}

#[derive(Subcommand, Debug)]
pub enum SecurityAction {
    /// List stored securities
    List {
        /// Only securities still waiting for a classification
        #[arg(long)]
        placeholders: bool,
    },
    /// Change the asset class of a security, regenerating its identifier
    Convert {
        ticker: String,
        #[arg(long)]
        class: AssetClass,
        #[arg(long)]
        subclass: AssetSubclass,
    },
}

#[derive(Tabled)]
struct SecurityRow {
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: AssetClass,
    #[tabled(rename = "Subclass")]
    subclass: AssetSubclass,
}

impl SecurityCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        let mut store = ctx.open_store()?;
        match &self.action {
            SecurityAction::List { placeholders } => {
                let mut rows: Vec<SecurityRow> = store
                    .data()
                    .securities()
                    .into_iter()
                    .filter(|(_, s)| !placeholders || s.is_placeholder())
                    .map(|(_, s)| SecurityRow {
                        identifier: s.identifier.clone(),
                        ticker: s.ticker.clone(),
                        name: s.name.clone(),
                        class: s.asset_class,
                        subclass: s.asset_subclass,
                    })
                    .collect();
                rows.sort_by(|a, b| a.identifier.cmp(&b.identifier));
                print_table(&rows, "No securities found");
            }
            SecurityAction::Convert {
                ticker,
                class,
                subclass,
            } => {
                let id = store
                    .data()
                    .find_security(ticker)
                    .ok_or_else(|| anyhow::anyhow!("security {ticker} not found"))?;
                let security =
                    store.atomic(|data| convert_security(data, id, *class, *subclass))?;
                store.save()?;
                println!(
                    "{} is now {} / {} ({})",
                    security.ticker,
                    security.asset_class,
                    security.asset_subclass,
                    security.identifier
                );
            }
        }
        Ok(())
    }
}
