//! ethtrace CLI - account history and historical balances
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin ethtrace -- history 0xde0b...7bae --from-block 4000000
//! cargo run --release --bin ethtrace -- history 0xde0b...7bae --tokens
//! cargo run --release --bin ethtrace -- balance 0xde0b...7bae 2021-01-01
//! cargo run --release --bin ethtrace -- balance 0xde0b...7bae 2021-01-01 --tokens
//! ```
//!
//! ## Environment Variables
//!
//! - ETHERSCAN_API_URL - API endpoint (default: https://api.etherscan.io/api)
//! - ETHERSCAN_API_KEY - API key (optional)
//! - REQUEST_TIMEOUT_SECS - HTTP timeout (default: 10)
//! - SETTLE_DELAY_MS - Pause between balance query waves (default: 1000)
//! - PAGE_CAP - Rows at which a query is treated as truncated (default: 10000)
//! - STRICT_AMOUNTS - Fail on malformed amounts instead of using 0 (default: false)
//! - RUST_LOG - Logging level (optional, default: info)

use clap::{Parser, Subcommand};
use ethtrace::{BalanceView, EtherscanProvider, Tracer, TracerConfig};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(about = "Account history and historical balances for Ethereum addresses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transactions and mining rewards, newest first
    History {
        address: String,

        #[arg(short, long, default_value_t = 0)]
        from_block: u64,

        /// Token transfers instead of native transactions
        #[arg(long)]
        tokens: bool,
    },
    /// Balance at 00:00 UTC of a day (YYYY-MM-DD)
    Balance {
        address: String,

        date: String,

        /// Per-token balances instead of the native balance
        #[arg(long)]
        tokens: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    // NOTE: Workaround for rustls issue
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        log::debug!("Crypto provider already installed");
    }

    let cli = Cli::parse();

    let provider = match EtherscanProvider::from_env() {
        Ok(provider) => provider,
        Err(e) => {
            log::error!("❌ Failed to build provider: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = TracerConfig::from_env();
    log::info!("🚀 Starting ethtrace");
    log::info!("   Settle delay: {}ms", config.settle_delay.as_millis());
    log::info!("   Page cap: {}", config.page_cap);
    log::info!("   Amount policy: {:?}", config.amount_policy);

    let tracer = Tracer::new(Arc::new(provider), config);

    let lines = match cli.command {
        Commands::History {
            address,
            from_block,
            tokens,
        } => tracer.history(!tokens, from_block, &address).await.map(|report| {
            if report.incomplete {
                log::warn!("⚠️  At least one query hit the page cap; history may be incomplete");
            }
            report.value
        }),
        Commands::Balance {
            address,
            date,
            tokens,
        } => tracer
            .balance(!tokens, &address, &date)
            .await
            .map(|view| {
                if let BalanceView::Tokens(breakdown) = &view {
                    if breakdown.incomplete {
                        log::warn!("⚠️  A token query hit the page cap; balances may be incomplete");
                    }
                }
                view.lines()
            }),
    };

    match lines {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
