use clap::{Parser, Subcommand};
use homebooks::cmd::{
    bill::BillCommand, depreciation::DepreciationCommand, estimate::EstimateCommand,
    import::ImportCommand, init::InitCommand, market::MarketCommand, report::ReportCommand,
    schema::SchemaCommand, security::SecurityCommand, Context,
};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "homebooks",
    version,
    about = "Brokerage, utility bill and rental property record keeping"
)]
struct Cli {
    /// Store snapshot file
    #[arg(long, global = true, env = "HOMEBOOKS_STORE", default_value = "homebooks.json")]
    store: PathBuf,

    /// AlphaVantage API key
    #[arg(long, global = true, env = "ALPHAVANTAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG applies otherwise
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the store, optionally loading reference data
    Init(InitCommand),
    /// Import statements, bills, rate tables and news
    Import(ImportCommand),
    /// List and reclassify securities
    Security(SecurityCommand),
    /// List bills and derive new ones
    Bill(BillCommand),
    /// Estimate a utility bill for different usage
    Estimate(EstimateCommand),
    /// Calculate and store depreciation
    Depreciation(DepreciationCommand),
    /// Summaries of bills, realized pnl and income
    Report(ReportCommand),
    /// Query AlphaVantage
    Market(MarketCommand),
    /// Describe the CSV templates
    Schema(SchemaCommand),
}

fn init_logging(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) if verbose == 0 => {
            builder.parse_filters(&filters);
        }
        _ => {
            builder.filter_level(match verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            });
        }
    }
    builder.init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context {
        store: cli.store,
        api_key: cli.api_key,
    };
    match cli.command {
        Command::Init(cmd) => cmd.exec(&ctx),
        Command::Import(cmd) => cmd.exec(&ctx),
        Command::Security(cmd) => cmd.exec(&ctx),
        Command::Bill(cmd) => cmd.exec(&ctx),
        Command::Estimate(cmd) => cmd.exec(&ctx),
        Command::Depreciation(cmd) => cmd.exec(&ctx),
        Command::Report(cmd) => cmd.exec(&ctx),
        Command::Market(cmd) => cmd.exec(&ctx),
        Command::Schema(cmd) => cmd.exec(),
    }
}
