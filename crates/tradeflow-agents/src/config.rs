//! Configuration of the baseline agents.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Baseline agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Simulated latency per stage call.
    #[serde(default)]
    pub latency: Duration,

    /// Import tax rate applied to the declared value (0.2 = 20% VAT).
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,

    /// Currency the duty breakdown is expressed in.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_tax_rate() -> f64 {
    0.2
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            tax_rate: default_tax_rate(),
            currency: default_currency(),
        }
    }
}

impl BaselineConfig {
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}
