//! AlphaVantage market data. Requests are an [`Endpoint`] plus ordered typed
//! parameters; responses are JSON documents or CSV tables depending on the
//! endpoint and the `datatype` parameter.

mod alphavantage;
mod news;
mod prices;

pub use alphavantage::AlphaVantage;
pub use news::fetch_news_sentiment;
pub use prices::{fetch_daily_prices, DailyPrice};

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use thiserror::Error;

pub const BASE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    TimeSeriesDaily,
    GlobalQuote,
    Overview,
    ListingStatus,
    NewsSentiment,
}

impl Endpoint {
    /// Value of the `function` query parameter.
    pub fn function(self) -> &'static str {
        match self {
            Endpoint::TimeSeriesDaily => "TIME_SERIES_DAILY",
            Endpoint::GlobalQuote => "GLOBAL_QUOTE",
            Endpoint::Overview => "OVERVIEW",
            Endpoint::ListingStatus => "LISTING_STATUS",
            Endpoint::NewsSentiment => "NEWS_SENTIMENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputSize {
    Compact,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    #[default]
    Latest,
    Earliest,
    Relevance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Topic {
    Blockchain,
    Earnings,
    Ipo,
    MergersAndAcquisitions,
    FinancialMarkets,
    EconomyFiscal,
    EconomyMonetary,
    EconomyMacro,
    EnergyTransportation,
    Finance,
    LifeSciences,
    Manufacturing,
    RealEstate,
    RetailWholesale,
    Technology,
}

/// Enumerated parameter values and their wire spelling.
pub trait ParamEnum: Copy {
    fn value(self) -> &'static str;
}

impl ParamEnum for OutputSize {
    fn value(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl ParamEnum for DataType {
    fn value(self) -> &'static str {
        match self {
            DataType::Json => "json",
            DataType::Csv => "csv",
        }
    }
}

impl ParamEnum for SortOrder {
    fn value(self) -> &'static str {
        match self {
            SortOrder::Latest => "LATEST",
            SortOrder::Earliest => "EARLIEST",
            SortOrder::Relevance => "RELEVANCE",
        }
    }
}

impl ParamEnum for Topic {
    fn value(self) -> &'static str {
        match self {
            Topic::Blockchain => "blockchain",
            Topic::Earnings => "earnings",
            Topic::Ipo => "ipo",
            Topic::MergersAndAcquisitions => "mergers_and_acquisitions",
            Topic::FinancialMarkets => "financial_markets",
            Topic::EconomyFiscal => "economy_fiscal",
            Topic::EconomyMonetary => "economy_monetary",
            Topic::EconomyMacro => "economy_macro",
            Topic::EnergyTransportation => "energy_transportation",
            Topic::Finance => "finance",
            Topic::LifeSciences => "life_sciences",
            Topic::Manufacturing => "manufacturing",
            Topic::RealEstate => "real_estate",
            Topic::RetailWholesale => "retail_wholesale",
            Topic::Technology => "technology",
        }
    }
}

/// A typed query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Enum(&'static str),
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn encode(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            ParamValue::Enum(value) => value.to_string(),
            ParamValue::Bool(value) => value.to_string(),
            ParamValue::Int(value) => value.to_string(),
            ParamValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            ParamValue::DateTime(datetime) => datetime.format("%Y%m%dT%H%M").to_string(),
            ParamValue::List(values) => values
                .iter()
                .map(ParamValue::encode)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    pub fn enumerated<E: ParamEnum>(value: E) -> Self {
        ParamValue::Enum(value.value())
    }

    pub fn list<T: Into<ParamValue>>(values: impl IntoIterator<Item = T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        ParamValue::Date(value)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(value: NaiveDateTime) -> Self {
        ParamValue::DateTime(value)
    }
}

pub type Params = Vec<(&'static str, ParamValue)>;

/// Full request URL; parameters keep their order and `apikey` comes last.
pub fn base_create_url(
    endpoint: Endpoint,
    params: &[(&'static str, ParamValue)],
    api_key: &str,
) -> String {
    let mut url = format!("{BASE_URL}?function={}", endpoint.function());
    for (key, value) in params {
        url.push('&');
        url.push_str(key);
        url.push('=');
        url.push_str(&value.encode());
    }
    url.push_str("&apikey=");
    url.push_str(api_key);
    url
}

/// A failed market data request. `logged` records whether the failure has
/// already been reported so callers further up do not log it again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("market data request failed: {message}")]
pub struct MarketDataError {
    pub message: String,
    pub logged: bool,
}

impl MarketDataError {
    pub fn new(message: impl Into<String>) -> Self {
        MarketDataError {
            message: message.into(),
            logged: false,
        }
    }

    pub fn log_once(mut self) -> Self {
        if !self.logged {
            log::error!("{}", self.message);
            self.logged = true;
        }
        self
    }
}

/// Something that answers market data requests with a raw response body.
pub trait MarketDataSource {
    fn fetch(
        &self,
        endpoint: Endpoint,
        params: &[(&'static str, ParamValue)],
    ) -> Result<String, MarketDataError>;
}

/// Error responses come back as JSON with a 200 status.
fn check_error_body(body: &str) -> Result<(), MarketDataError> {
    if !body.trim_start().starts_with('{') {
        return Ok(());
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(());
    };
    for key in ["Error Message", "Note", "Information"] {
        if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
            return Err(MarketDataError::new(format!("{key}: {message}")));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Answers every request with a canned body and records the URLs.
    pub(crate) struct Canned {
        pub body: String,
        pub urls: RefCell<Vec<String>>,
    }

    impl Canned {
        pub(crate) fn new(body: &str) -> Self {
            Canned {
                body: body.to_string(),
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl MarketDataSource for Canned {
        fn fetch(
            &self,
            endpoint: Endpoint,
            params: &[(&'static str, ParamValue)],
        ) -> Result<String, MarketDataError> {
            self.urls
                .borrow_mut()
                .push(base_create_url(endpoint, params, "demo"));
            check_error_body(&self.body)?;
            Ok(self.body.clone())
        }
    }

    pub(crate) const NEWS_RESPONSE: &str = r#"{
        "items": "2",
        "sentiment_score_definition": "x <= -0.35: Bearish; ...",
        "feed": [
            {
                "title": "Apple unveils new chips",
                "url": "https://news.example.com/apple-chips",
                "time_published": "20240315T123000",
                "overall_sentiment_score": 0.21,
                "overall_sentiment_label": "Somewhat-Bullish",
                "ticker_sentiment": [
                    {
                        "ticker": "AAPL",
                        "relevance_score": "0.812345",
                        "ticker_sentiment_score": "0.3012345",
                        "ticker_sentiment_label": "Somewhat-Bullish"
                    },
                    {
                        "ticker": "NVDA",
                        "relevance_score": "0.1",
                        "ticker_sentiment_score": "-0.05",
                        "ticker_sentiment_label": "Neutral"
                    }
                ]
            },
            {
                "title": "Markets slide",
                "url": "https://news.example.com/markets-slide",
                "time_published": "20240316T080000",
                "ticker_sentiment": [
                    {
                        "ticker": "AAPL",
                        "relevance_score": "0.25",
                        "ticker_sentiment_score": "-0.4",
                        "ticker_sentiment_label": "Bearish"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn url_encodes_parameters_in_order() {
        let time_from = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let params: Params = vec![
            ("tickers", ParamValue::list(["AAPL", "MSFT"])),
            ("topics", ParamValue::List(vec![ParamValue::enumerated(Topic::Earnings)])),
            ("time_from", time_from.into()),
            ("sort", ParamValue::enumerated(SortOrder::Latest)),
            ("limit", 50u32.into()),
        ];
        assert_eq!(
            base_create_url(Endpoint::NewsSentiment, &params, "demo"),
            "https://www.alphavantage.co/query?function=NEWS_SENTIMENT&tickers=AAPL,MSFT\
             &topics=earnings&time_from=20240301T0930&sort=LATEST&limit=50&apikey=demo"
        );
    }

    #[test]
    fn scalar_encodings() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(ParamValue::from(date).encode(), "2024-01-05");
        assert_eq!(ParamValue::from(true).encode(), "true");
        assert_eq!(ParamValue::from(false).encode(), "false");
        assert_eq!(ParamValue::enumerated(OutputSize::Full).encode(), "full");
        assert_eq!(
            base_create_url(Endpoint::GlobalQuote, &[], "KEY"),
            "https://www.alphavantage.co/query?function=GLOBAL_QUOTE&apikey=KEY"
        );
    }

    #[test]
    fn every_value_kind_in_one_url() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let time_from = date.and_hms_opt(16, 5, 0).unwrap();
        let params: Params = vec![
            ("outputsize", ParamValue::enumerated(OutputSize::Compact)),
            ("adjusted", true.into()),
            ("date", date.into()),
            ("time_from", time_from.into()),
            (
                "mixed",
                ParamValue::List(vec![
                    ParamValue::enumerated(Topic::Ipo),
                    "VTI".into(),
                    date.into(),
                    false.into(),
                ]),
            ),
        ];
        assert_eq!(
            base_create_url(Endpoint::TimeSeriesDaily, &params, "demo"),
            "https://www.alphavantage.co/query?function=TIME_SERIES_DAILY&outputsize=compact\
             &adjusted=true&date=2024-01-05&time_from=20240105T1605\
             &mixed=ipo,VTI,2024-01-05,false&apikey=demo"
        );
    }

    #[test]
    fn error_bodies_are_failures() {
        assert!(check_error_body("timestamp,open\n2024-01-02,1.0\n").is_ok());
        assert!(check_error_body(r#"{"feed": []}"#).is_ok());
        let err = check_error_body(r#"{"Information": "rate limit reached"}"#).unwrap_err();
        assert_eq!(err.message, "Information: rate limit reached");
        assert!(!err.logged);
        assert!(err.log_once().logged);
    }
}
