use async_trait::async_trait;
use reqwest::Client;

use crate::{error::UpstreamError, model::DaySummary, provider::truncate_body};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather One Call 3.0 daily aggregation (`/onecall/day_summary`).
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_day_summary(&self, lat: f64, lon: f64, date: &str) -> Result<DaySummary, UpstreamError> {
        let url = format!("{}/data/3.0/onecall/day_summary", self.base_url);
        let (lat, lon) = (lat.to_string(), lon.to_string());

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("date", date),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| {
                UpstreamError::transport(format!("Failed to send request to OpenWeather (day summary): {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            UpstreamError::transport(format!("Failed to read OpenWeather day summary response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(UpstreamError::with_status(
                status.as_u16(),
                format!("OpenWeather day summary request failed: {}", truncate_body(&body)),
            ));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::transport(format!("Failed to parse OpenWeather day summary JSON: {e}"))
        })?;

        Ok(DaySummary(parsed))
    }
}
