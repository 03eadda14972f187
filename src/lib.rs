//! ethtrace - account history and historical balances for Ethereum addresses
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ethtrace::{EtherscanProvider, Tracer, TracerConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(EtherscanProvider::from_env()?);
//! let tracer = Tracer::new(provider, TracerConfig::from_env());
//!
//! let history = tracer.history(true, 0, "0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae").await?;
//! for line in history.value {
//!     println!("{}", line);
//! }
//!
//! let balance = tracer.balance(true, "0xde0b295669a9fd93d5f28d9ec85e40f4cb697bae", "2021-01-01").await?;
//! println!("{}", balance.lines().join("\n"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod provider;

pub use config::TracerConfig;
pub use engine::{BalanceView, Tracer};
pub use error::{TracerError, TracerResult};
pub use provider::{EtherscanProvider, LedgerProvider};
