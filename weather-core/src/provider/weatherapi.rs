use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::{Kelvin, ProviderError};

use super::{TemperatureProvider, fetch, lenient_code};

const BASE_URL: &str = "https://api.weatherapi.com";

/// WeatherAPI.com current conditions (the former Apixu API). Reports Celsius.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, base_url: BASE_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

#[derive(Debug, Default, Deserialize)]
struct WaErrorBody {
    #[serde(default, deserialize_with = "lenient_code")]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct WaError {
    #[serde(default)]
    error: WaErrorBody,
}

#[async_trait]
impl TemperatureProvider for WeatherApiProvider {
    async fn temperature(&self, city: &str) -> Result<Kelvin, ProviderError> {
        let url = format!("{}/v1/current.json", self.base_url);

        let (status, body) =
            fetch(self.http.get(url).query(&[("key", self.api_key.as_str()), ("q", city)])).await?;

        if status != StatusCode::OK {
            let err: WaError = serde_json::from_str(&body).unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                code: err.error.code,
                message: err.error.message,
            });
        }

        let parsed: WaResponse = serde_json::from_str(&body)?;
        let kelvin = Kelvin::from_celsius(parsed.current.temp_c);

        info!(provider = "weatherapi", "weatherapi: {city}: {kelvin:.2}");
        Ok(kelvin)
    }
}
