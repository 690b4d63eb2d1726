//! Core library for the weather aggregation service.
//!
//! This crate defines:
//! - Temperature providers behind one async capability trait
//! - The concurrent aggregator that averages their readings
//! - Configuration & credentials handling
//! - Shared domain models and error types
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregator::Aggregator;
pub use config::{Config, ProviderConfig};
pub use error::{AggregationError, ProviderError};
pub use model::{Kelvin, WeatherReport};
pub use provider::{ProviderId, TemperatureProvider};
