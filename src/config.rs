//! Engine configuration from environment variables

use crate::ledger::AmountPolicy;
use std::env;
use std::time::Duration;

/// Largest page the provider returns for a single list query
pub const DEFAULT_PAGE_CAP: usize = 10_000;

/// Configuration for the tracer engine
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Pause between the two query waves of a balance reconstruction
    pub settle_delay: Duration,

    /// A query returning at least this many rows marks the result incomplete
    pub page_cap: usize,

    /// Handling of amount strings that are not plain integers
    pub amount_policy: AmountPolicy,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1_000),
            page_cap: DEFAULT_PAGE_CAP,
            amount_policy: AmountPolicy::Tolerant,
        }
    }
}

impl TracerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SETTLE_DELAY_MS` (default: 1000)
    /// - `PAGE_CAP` (default: 10000)
    /// - `STRICT_AMOUNTS` (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    ///
    /// # Arguments
    /// * `lookup` - Returns the raw value for a variable name, if set
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let settle_delay = Duration::from_millis(
            lookup("SETTLE_DELAY_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1_000),
        );

        let page_cap = lookup("PAGE_CAP")
            .and_then(|s| s.trim().parse().ok())
            .filter(|cap: &usize| *cap > 0)
            .unwrap_or(DEFAULT_PAGE_CAP);

        let strict = lookup("STRICT_AMOUNTS")
            .unwrap_or_else(|| "false".to_string())
            .trim()
            .to_lowercase()
            .parse::<bool>()
            .unwrap_or(false);

        Self {
            settle_delay,
            page_cap,
            amount_policy: if strict {
                AmountPolicy::Strict
            } else {
                AmountPolicy::Tolerant
            },
        }
    }

    /// No settle delay; for fixtures and tests
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
