use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::{Kelvin, ProviderError};

use super::{TemperatureProvider, fetch, lenient_code};

const BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeatherMap current weather. Reports Kelvin when no `units` parameter is sent.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

#[derive(Debug, Default, Deserialize)]
struct OwError {
    #[serde(default, deserialize_with = "lenient_code")]
    cod: i64,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl TemperatureProvider for OpenWeatherProvider {
    async fn temperature(&self, city: &str) -> Result<Kelvin, ProviderError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let (status, body) = fetch(
            self.http
                .get(url)
                .query(&[("appid", self.api_key.as_str()), ("q", city)]),
        )
        .await?;

        if status != StatusCode::OK {
            let err: OwError = serde_json::from_str(&body).unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                code: err.cod,
                message: err.message,
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        let kelvin = Kelvin::new(parsed.main.temp);

        info!(provider = "openweather", "openweather: {city}: {kelvin:.2}");
        Ok(kelvin)
    }
}
