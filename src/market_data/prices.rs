use super::{DataType, Endpoint, MarketDataError, MarketDataSource, OutputSize, ParamValue};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tabled::Tabled;

/// One row of a `TIME_SERIES_DAILY` CSV response.
#[derive(Debug, Clone, PartialEq, Deserialize, Tabled)]
pub struct DailyPrice {
    #[serde(rename = "timestamp")]
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

pub(crate) fn parse_daily_prices(body: &str) -> Result<Vec<DailyPrice>, MarketDataError> {
    csv::Reader::from_reader(body.as_bytes())
        .deserialize()
        .collect::<Result<Vec<DailyPrice>, _>>()
        .map_err(|e| MarketDataError::new(format!("invalid daily price table: {e}")))
}

/// Daily prices for `symbol`, oldest first.
pub fn fetch_daily_prices<M: MarketDataSource + ?Sized>(
    source: &M,
    symbol: &str,
    output_size: OutputSize,
) -> Result<Vec<DailyPrice>, MarketDataError> {
    let params = [
        ("symbol", ParamValue::from(symbol)),
        ("outputsize", ParamValue::enumerated(output_size)),
        ("datatype", ParamValue::enumerated(DataType::Csv)),
    ];
    let body = source.fetch(Endpoint::TimeSeriesDaily, &params)?;
    let mut prices = parse_daily_prices(&body)?;
    prices.sort_by_key(|p| p.date);
    log::info!("{} {} prices fetched", prices.len(), symbol);
    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::tests::Canned;
    use rust_decimal_macros::dec;

    #[test]
    fn reads_csv_table_oldest_first() {
        let source = Canned::new(
            "timestamp,open,high,low,close,volume\n\
             2024-03-15,171.17,172.62,170.29,172.62,121664700\n\
             2024-03-14,172.91,174.31,172.05,173.00,72913500\n",
        );
        let prices = fetch_daily_prices(&source, "AAPL", OutputSize::Compact).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(prices[1].close, dec!(172.62));
        assert!(source.urls.borrow()[0].contains("&outputsize=compact&datatype=csv&"));
    }
}
