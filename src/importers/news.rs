//! News sentiment from the market data source. Articles already stored for a
//! ticker are skipped, so repeated fetches over overlapping windows are safe.

use super::ImportError;
use crate::market_data::{fetch_news_sentiment, MarketDataSource, SortOrder, Topic};
use crate::store::NewsRepository;
use chrono::NaiveDateTime;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct NewsImport {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn import<S, M>(
    store: &mut S,
    source: &M,
    tickers: &[String],
    topics: &[Topic],
    time_from: Option<NaiveDateTime>,
    limit: u32,
) -> Result<NewsImport, ImportError>
where
    S: NewsRepository,
    M: MarketDataSource + ?Sized,
{
    let news = fetch_news_sentiment(source, tickers, topics, time_from, SortOrder::Latest, limit)
        .map_err(|e| e.log_once())?;

    let mut result = NewsImport::default();
    for item in news {
        let exists = store
            .news()
            .iter()
            .any(|n| n.ticker == item.ticker && n.url == item.url);
        if exists {
            log::debug!("news for {} already stored: {}", item.ticker, item.url);
            result.skipped += 1;
            continue;
        }
        store.insert_news(item)?;
        result.inserted += 1;
    }
    log::info!(
        "imported {} news sentiment rows, {} already stored",
        result.inserted,
        result.skipped
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importers::ErrorKind;
    use crate::market_data::tests::{Canned, NEWS_RESPONSE};
    use crate::store::MemoryStore;

    #[test]
    fn second_fetch_skips_stored_articles() {
        let source = Canned::new(NEWS_RESPONSE);
        let tickers = vec!["AAPL".to_string()];
        let mut store = MemoryStore::default();

        let first = import(&mut store, &source, &tickers, &[], None, 50).unwrap();
        assert_eq!(first, NewsImport { inserted: 2, skipped: 0 });
        let second = import(&mut store, &source, &tickers, &[], None, 50).unwrap();
        assert_eq!(second, NewsImport { inserted: 0, skipped: 2 });
        assert_eq!(store.news().len(), 2);
    }

    #[test]
    fn failed_request_is_external_and_logged() {
        let source = Canned::new(r#"{"Error Message": "Invalid API call"}"#);
        let mut store = MemoryStore::default();
        let err = import(&mut store, &source, &[], &[], None, 50).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::External);
        match err {
            ImportError::MarketData(e) => assert!(e.logged),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
