use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tracing::info;
use weather_core::{Aggregator, Config, ProviderId, provider::providers_from_config};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Aggregated current temperature from several weather providers")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP endpoint.
    Serve {
        /// Listen address, e.g. "127.0.0.1:8080".
        #[arg(long)]
        listen: Option<String>,

        /// Global aggregation deadline in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather", "weatherapi" or "tomorrowio".
        provider: String,
    },

    /// Remove a provider from the configuration.
    Remove {
        provider: String,
    },

    /// List supported providers and whether they are configured.
    Providers,

    /// Print the aggregated temperature for a city once.
    Show {
        /// City name, optionally with region/country, e.g. "Paris,TX,US".
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = self.load_config()?;

        match self.command {
            Command::Serve { ref listen, timeout } => {
                if let Some(listen) = listen {
                    config.listen_addr = Some(listen.clone());
                }
                if let Some(secs) = timeout {
                    config.timeout_secs = Some(secs);
                }
                config.validate().context("Invalid serve options")?;

                let aggregator = Arc::new(aggregator_from_config(&config)?);
                server::run_http_server(aggregator, config.listen_addr()).await?;
            }
            Command::Configure { ref provider } => {
                let id = ProviderId::try_from(provider.as_str())?;

                let api_key = Password::new(&format!("API key for {id}:"))
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                let api_key = api_key.trim().to_string();
                if api_key.is_empty() {
                    bail!("API key for '{id}' must not be empty");
                }

                config.upsert_provider_api_key(id, api_key);
                self.save_config(&config)?;
                println!("Provider '{id}' configured.");
            }
            Command::Remove { ref provider } => {
                let id = ProviderId::try_from(provider.as_str())?;

                if config.remove_provider(id) {
                    self.save_config(&config)?;
                    println!("Provider '{id}' removed.");
                } else {
                    println!("Provider '{id}' was not configured.");
                }
            }
            Command::Providers => {
                for id in ProviderId::all() {
                    let state =
                        if config.is_provider_configured(*id) { "configured" } else { "not configured" };
                    println!("{id:<12} {state}");
                }
            }
            Command::Show { ref city } => {
                let aggregator = aggregator_from_config(&config)?;

                let begin = Instant::now();
                let temperature = aggregator.temperature(city).await?;
                println!("{city}: {temperature:.2} K (took {:?})", begin.elapsed());
            }
        }

        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    fn save_config(&self, config: &Config) -> anyhow::Result<()> {
        match &self.config {
            Some(path) => config.save_to(path),
            None => config.save(),
        }
    }
}

/// Aggregator over every configured provider, bounded by the configured deadline.
pub fn aggregator_from_config(config: &Config) -> anyhow::Result<Aggregator> {
    let providers = providers_from_config(config)?;
    info!(
        providers = providers.len(),
        deadline = ?config.aggregation_deadline(),
        request_timeout = ?config.request_timeout(),
        "provider set ready"
    );

    Ok(Aggregator::new(providers).with_deadline(config.aggregation_deadline()))
}
