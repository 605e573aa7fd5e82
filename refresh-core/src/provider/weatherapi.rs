use async_trait::async_trait;
use reqwest::Client;

use crate::{error::UpstreamError, model::DaySummary, provider::truncate_body};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";

/// WeatherAPI.com history endpoint, queried by coordinate and date.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self { api_key, base_url: base_url.into().trim_end_matches('/').to_string(), http: Client::new() }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn fetch_day_summary(&self, lat: f64, lon: f64, date: &str) -> Result<DaySummary, UpstreamError> {
        let url = format!("{}/v1/history.json", self.base_url);
        let q = format!("{lat},{lon}");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", q.as_str()), ("dt", date)])
            .send()
            .await
            .map_err(|e| UpstreamError::transport(format!("Failed to send request to WeatherAPI.com (history): {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| UpstreamError::transport(format!("Failed to read WeatherAPI history response body: {e}")))?;

        if !status.is_success() {
            return Err(UpstreamError::with_status(
                status.as_u16(),
                format!("WeatherAPI history request failed: {}", truncate_body(&body)),
            ));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::transport(format!("Failed to parse WeatherAPI history JSON: {e}")))?;

        Ok(DaySummary(parsed))
    }
}
