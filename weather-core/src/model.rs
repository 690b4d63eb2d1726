use serde::{Deserialize, Serialize};
use std::fmt;

const CELSIUS_OFFSET: f64 = 273.15;

/// Absolute temperature, the canonical unit passed between providers and the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kelvin(f64);

impl Kelvin {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn from_celsius(celsius: f64) -> Self {
        Self(celsius + CELSIUS_OFFSET)
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Kelvin {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}", p, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Body of a successful `GET /weather/{city}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: Kelvin,
    pub took: String,
}
