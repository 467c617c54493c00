use super::{
    base_create_url, check_error_body, Endpoint, MarketDataError, MarketDataSource, ParamValue,
};
use reqwest::blocking::Client;

/// Blocking HTTP client for the AlphaVantage query API.
pub struct AlphaVantage {
    api_key: String,
    client: Client,
}

impl AlphaVantage {
    pub fn new(api_key: impl Into<String>) -> Result<Self, MarketDataError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MarketDataError::new("AlphaVantage API key required"));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| MarketDataError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(AlphaVantage { api_key, client })
    }
}

impl MarketDataSource for AlphaVantage {
    fn fetch(
        &self,
        endpoint: Endpoint,
        params: &[(&'static str, ParamValue)],
    ) -> Result<String, MarketDataError> {
        let url = base_create_url(endpoint, params, &self.api_key);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| MarketDataError::new(format!("{}: {e}", endpoint.function())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::new(format!(
                "{}: HTTP {status}",
                endpoint.function()
            )));
        }
        let body = response
            .text()
            .map_err(|e| MarketDataError::new(format!("{}: {e}", endpoint.function())))?;
        check_error_body(&body)?;
        log::info!("{} fetched, {} bytes", endpoint.function(), body.len());
        Ok(body)
    }
}
