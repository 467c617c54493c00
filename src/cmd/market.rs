//! Market command - query AlphaVantage without touching the store

use super::{print_table, Context};
use crate::core::SentimentLabel;
use crate::market_data::{fetch_daily_prices, fetch_news_sentiment, OutputSize, SortOrder, Topic};
use chrono::NaiveDateTime;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct MarketCommand {
    #[command(subcommand)]
    query: MarketQuery,
}

#[derive(Subcommand, Debug)]
pub enum MarketQuery {
    /// News sentiment per ticker
    News {
        /// Comma separated tickers
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,
        #[arg(long, value_enum, value_delimiter = ',')]
        topics: Vec<Topic>,
        #[arg(long)]
        time_from: Option<NaiveDateTime>,
        #[arg(long, value_enum, default_value_t = SortOrder::Latest)]
        sort: SortOrder,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Daily open, high, low, close and volume
    Prices {
        symbol: String,
        #[arg(long, value_enum, default_value_t = OutputSize::Compact)]
        output_size: OutputSize,
    },
}

#[derive(Tabled)]
struct NewsRow {
    #[tabled(rename = "Published")]
    published: NaiveDateTime,
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Sentiment")]
    label: SentimentLabel,
    #[tabled(rename = "Score")]
    score: Decimal,
    #[tabled(rename = "Relevance")]
    relevance: Decimal,
    #[tabled(rename = "Title")]
    title: String,
}

impl MarketCommand {
    pub fn exec(&self, ctx: &Context) -> anyhow::Result<()> {
        let source = ctx.market_data()?;
        match &self.query {
            MarketQuery::News {
                tickers,
                topics,
                time_from,
                sort,
                limit,
            } => {
                let news = fetch_news_sentiment(&source, tickers, topics, *time_from, *sort, *limit)
                    .map_err(|e| e.log_once())?;
                let rows: Vec<NewsRow> = news
                    .into_iter()
                    .map(|n| NewsRow {
                        published: n.published,
                        ticker: n.ticker,
                        label: n.label,
                        score: n.score,
                        relevance: n.relevance,
                        title: n.title,
                    })
                    .collect();
                print_table(&rows, "No news found");
            }
            MarketQuery::Prices {
                symbol,
                output_size,
            } => {
                let prices =
                    fetch_daily_prices(&source, symbol, *output_size).map_err(|e| e.log_once())?;
                print_table(&prices, "No prices returned");
            }
        }
        Ok(())
    }
}
