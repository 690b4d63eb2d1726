use crate::{
    Config, Kelvin, ProviderError,
    error::error_chain,
    provider::{
        openweather::OpenWeatherProvider, tomorrowio::TomorrowIoProvider,
        weatherapi::WeatherApiProvider,
    },
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Deserializer};
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod openweather;
pub mod tomorrowio;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
    TomorrowIo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::TomorrowIo => "tomorrowio",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi, ProviderId::TomorrowIo]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "tomorrowio" => Ok(ProviderId::TomorrowIo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi, tomorrowio."
            )),
        }
    }
}

/// A remote source able to report the current temperature of a city.
///
/// The city is forwarded to the remote API as given; implementations do not
/// validate or normalize it.
#[async_trait]
pub trait TemperatureProvider: Send + Sync + Debug {
    async fn temperature(&self, city: &str) -> Result<Kelvin, ProviderError>;
}

/// Shared HTTP client for provider requests. Every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    http: Client,
) -> anyhow::Result<Arc<dyn TemperatureProvider>> {
    let provider = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` and enter your API key."
        )
    })?;

    let api_key = provider.api_key.clone();
    let base_url = provider.base_url.clone();

    let shared: Arc<dyn TemperatureProvider> = match id {
        ProviderId::OpenWeather => {
            let p = OpenWeatherProvider::new(api_key, http);
            Arc::new(match base_url {
                Some(url) => p.with_base_url(url),
                None => p,
            })
        }
        ProviderId::WeatherApi => {
            let p = WeatherApiProvider::new(api_key, http);
            Arc::new(match base_url {
                Some(url) => p.with_base_url(url),
                None => p,
            })
        }
        ProviderId::TomorrowIo => {
            let p = TomorrowIoProvider::new(api_key, http);
            Arc::new(match base_url {
                Some(url) => p.with_base_url(url),
                None => p,
            })
        }
    };

    Ok(shared)
}

/// Build every configured provider, in `ProviderId::all()` order.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Vec<Arc<dyn TemperatureProvider>>> {
    let http = http_client(config.request_timeout())?;

    config
        .configured_providers()
        .into_iter()
        .map(|id| provider_from_config(id, config, http.clone()))
        .collect()
}

/// Send the request and read the whole body. The response is consumed on every path.
///
/// A body that cannot be read is empty on a non-200 status (the error envelope
/// then falls back to code 0) and a decode failure on 200.
pub(crate) async fn fetch(request: RequestBuilder) -> Result<(StatusCode, String), ProviderError> {
    let res = request.send().await?;
    let status = res.status();

    if status != StatusCode::OK {
        return Ok((status, res.text().await.unwrap_or_default()));
    }

    let body = res
        .text()
        .await
        .map_err(|e| ProviderError::Decode(error_chain(&e.without_url())))?;
    Ok((status, body))
}

/// Error codes arrive as numbers from most APIs and as strings from OpenWeather.
/// Anything unreadable becomes 0.
pub(crate) fn lenient_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}
