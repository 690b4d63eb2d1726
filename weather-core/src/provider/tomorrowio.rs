use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::{Kelvin, ProviderError};

use super::{TemperatureProvider, fetch, lenient_code};

const BASE_URL: &str = "https://api.tomorrow.io";

/// Tomorrow.io realtime conditions, requested in metric units (Celsius).
#[derive(Debug, Clone)]
pub struct TomorrowIoProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl TomorrowIoProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, base_url: BASE_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct TioValues {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct TioData {
    values: TioValues,
}

#[derive(Debug, Deserialize)]
struct TioRealtimeResponse {
    data: TioData,
}

#[derive(Debug, Default, Deserialize)]
struct TioError {
    #[serde(default, deserialize_with = "lenient_code")]
    code: i64,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl TemperatureProvider for TomorrowIoProvider {
    async fn temperature(&self, city: &str) -> Result<Kelvin, ProviderError> {
        let url = format!("{}/v4/weather/realtime", self.base_url);

        let (status, body) = fetch(self.http.get(url).query(&[
            ("apikey", self.api_key.as_str()),
            ("location", city),
            ("units", "metric"),
        ]))
        .await?;

        if status != StatusCode::OK {
            let err: TioError = serde_json::from_str(&body).unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                code: err.code,
                message: err.message,
            });
        }

        let parsed: TioRealtimeResponse = serde_json::from_str(&body)?;
        let kelvin = Kelvin::from_celsius(parsed.data.values.temperature);

        info!(provider = "tomorrowio", "tomorrowio: {city}: {kelvin:.2}");
        Ok(kelvin)
    }
}
