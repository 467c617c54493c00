use super::{Endpoint, MarketDataError, MarketDataSource, ParamValue, Params, SortOrder, Topic};
use crate::core::{RoundFields, SentimentLabel};
use crate::models::NewsSentiment;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

const PUBLISHED_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    feed: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    url: String,
    time_published: String,
    #[serde(default)]
    ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Deserialize)]
struct TickerSentiment {
    ticker: String,
    relevance_score: String,
    ticker_sentiment_score: String,
    ticker_sentiment_label: String,
}

fn decimal(value: &str, field: &str) -> Result<Decimal, MarketDataError> {
    Decimal::from_str(value.trim())
        .or_else(|_| Decimal::from_scientific(value.trim()))
        .map_err(|_| MarketDataError::new(format!("invalid {field}: '{value}'")))
}

impl TickerSentiment {
    fn into_news(self, article: &Article) -> Result<NewsSentiment, MarketDataError> {
        let published = NaiveDateTime::parse_from_str(&article.time_published, PUBLISHED_FORMAT)
            .map_err(|_| {
                MarketDataError::new(format!(
                    "invalid time_published: '{}'",
                    article.time_published
                ))
            })?;
        let label =
            SentimentLabel::from_str(&self.ticker_sentiment_label).map_err(MarketDataError::new)?;
        Ok(NewsSentiment {
            ticker: self.ticker,
            title: article.title.clone(),
            url: article.url.clone(),
            published,
            label,
            score: decimal(&self.ticker_sentiment_score, "ticker_sentiment_score")?,
            relevance: decimal(&self.relevance_score, "relevance_score")?,
        }
        .rounded())
    }
}

/// Per-ticker sentiment rows from a `NEWS_SENTIMENT` response, restricted to
/// the requested tickers.
pub(crate) fn parse_news(
    body: &str,
    tickers: &[String],
) -> Result<Vec<NewsSentiment>, MarketDataError> {
    let feed: Feed = serde_json::from_str(body)
        .map_err(|e| MarketDataError::new(format!("invalid news response: {e}")))?;
    let mut news = Vec::new();
    for mut article in feed.feed {
        let sentiments = std::mem::take(&mut article.ticker_sentiment);
        for sentiment in sentiments {
            let requested = tickers
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&sentiment.ticker));
            if !tickers.is_empty() && !requested {
                continue;
            }
            news.push(sentiment.into_news(&article)?);
        }
    }
    Ok(news)
}

pub fn fetch_news_sentiment<M: MarketDataSource + ?Sized>(
    source: &M,
    tickers: &[String],
    topics: &[Topic],
    time_from: Option<NaiveDateTime>,
    sort: SortOrder,
    limit: u32,
) -> Result<Vec<NewsSentiment>, MarketDataError> {
    let mut params: Params = Vec::new();
    if !tickers.is_empty() {
        params.push(("tickers", ParamValue::list(tickers.iter().cloned())));
    }
    if !topics.is_empty() {
        params.push((
            "topics",
            ParamValue::List(topics.iter().copied().map(ParamValue::enumerated).collect()),
        ));
    }
    if let Some(time_from) = time_from {
        params.push(("time_from", time_from.into()));
    }
    params.push(("sort", ParamValue::enumerated(sort)));
    params.push(("limit", limit.into()));

    let body = source.fetch(Endpoint::NewsSentiment, &params)?;
    let news = parse_news(&body, tickers)?;
    log::info!("{} news sentiment rows fetched", news.len());
    Ok(news)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::tests::{Canned, NEWS_RESPONSE as RESPONSE};
    use rust_decimal_macros::dec;

    #[test]
    fn keeps_requested_tickers_only() {
        let source = Canned::new(RESPONSE);
        let tickers = vec!["AAPL".to_string()];
        let news =
            fetch_news_sentiment(&source, &tickers, &[], None, SortOrder::Latest, 50).unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].label, SentimentLabel::SomewhatBullish);
        assert_eq!(news[0].score, dec!(0.301235));
        assert_eq!(news[1].label, SentimentLabel::Bearish);
        assert_eq!(
            source.urls.borrow()[0],
            "https://www.alphavantage.co/query?function=NEWS_SENTIMENT&tickers=AAPL&sort=LATEST&limit=50&apikey=demo"
        );
    }

    #[test]
    fn rate_limit_message_is_an_error() {
        let source = Canned::new(r#"{"Note": "Thank you for using Alpha Vantage!"}"#);
        let err = fetch_news_sentiment(&source, &[], &[], None, SortOrder::Latest, 10).unwrap_err();
        assert!(err.message.starts_with("Note:"));
    }

    #[test]
    fn unknown_label_is_an_error() {
        let body = RESPONSE.replace("\"Bearish\"", "\"Gloomy\"");
        assert!(parse_news(&body, &[]).is_err());
    }
}
