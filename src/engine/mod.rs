//! Tracer engine - history reports and balance reconstruction
//!
//! # Architecture
//!
//! ```text
//! Tracer::history / Tracer::balance
//!     ↓
//! FanOut (one task per provider query, first failure cancels the rest)
//!     ↓
//! LedgerProvider → Normalizer → Event / Token
//!     ↓
//! render_events / render_tokens / BalanceReport / TokenBreakdown
//! ```

pub mod balance;
pub mod fanout;
pub mod history;

pub use fanout::FanOut;

use crate::config::TracerConfig;
use crate::error::TracerResult;
use crate::ledger::{
    Address, Annotated, BalanceReport, Event, MinedBlockKind, Normalizer, Token, TokenBreakdown,
    TokenStandard, TransferKind,
};
use crate::provider::{BlockRange, LedgerProvider};
use std::future::Future;
use std::sync::Arc;

/// Rows from one provider query after normalization
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub label: &'static str,
    /// Rows the provider returned, before any local filtering
    pub fetched: usize,
    pub items: Vec<T>,
}

/// Result of [`Tracer::balance`]
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceView {
    Native(BalanceReport),
    Tokens(TokenBreakdown),
}

impl BalanceView {
    pub fn incomplete(&self) -> bool {
        match self {
            BalanceView::Native(report) => report.incomplete,
            BalanceView::Tokens(breakdown) => breakdown.incomplete,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            BalanceView::Native(report) => vec![report.to_string()],
            BalanceView::Tokens(breakdown) => breakdown.lines(),
        }
    }
}

/// Answers history and balance questions for one address per call
///
/// Holds no per-request state; every call builds its records from fresh
/// provider responses and drops them when it returns.
#[derive(Clone)]
pub struct Tracer {
    provider: Arc<dyn LedgerProvider>,
    config: TracerConfig,
}

impl Tracer {
    pub fn new(provider: Arc<dyn LedgerProvider>, config: TracerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Native history when `use_native`, token history otherwise
    pub async fn history(
        &self,
        use_native: bool,
        from_block: u64,
        address: &str,
    ) -> TracerResult<Annotated<Vec<String>>> {
        let address = Address::new(address);
        if use_native {
            self.transaction_history(&address, from_block).await
        } else {
            self.token_history(&address, from_block).await
        }
    }

    /// Reconstructed native balance when `use_native`, per-token balances otherwise
    pub async fn balance(
        &self,
        use_native: bool,
        address: &str,
        date: &str,
    ) -> TracerResult<BalanceView> {
        let address = Address::new(address);
        if use_native {
            Ok(BalanceView::Native(self.balance_at_date(&address, date).await?))
        } else {
            Ok(BalanceView::Tokens(
                self.token_balance_at_date(&address, date).await?,
            ))
        }
    }

    fn normalizer(&self, address: &Address) -> Normalizer {
        Normalizer::new(address.clone(), self.config.amount_policy)
    }

    /// A full page means the provider may have cut the result short
    fn hits_page_cap<T>(&self, page: &Page<T>) -> bool {
        if page.fetched >= self.config.page_cap {
            log::warn!(
                "⚠️  {} returned {} rows (page cap {}), result may be incomplete",
                page.label,
                page.fetched,
                self.config.page_cap
            );
            true
        } else {
            false
        }
    }

    fn transfers_query(
        &self,
        address: &Address,
        range: BlockRange,
        kind: TransferKind,
        label: &'static str,
    ) -> impl Future<Output = TracerResult<Page<Event>>> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let normalizer = self.normalizer(address);
        async move {
            let rows = provider
                .fetch_transfers(normalizer.owner(), range, kind)
                .await?;
            log::debug!("{}: {} rows from {}", label, rows.len(), provider.provider_name());
            Ok(Page {
                label,
                fetched: rows.len(),
                items: normalizer.transfers(rows, kind)?,
            })
        }
    }

    /// Every block the address mined; the provider takes no block range
    fn mined_blocks_query(
        &self,
        address: &Address,
        kind: MinedBlockKind,
        label: &'static str,
    ) -> impl Future<Output = TracerResult<Page<Event>>> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let normalizer = self.normalizer(address);
        async move {
            let rows = provider.fetch_mined_blocks(normalizer.owner(), kind).await?;
            log::debug!("{}: {} rows from {}", label, rows.len(), provider.provider_name());
            Ok(Page {
                label,
                fetched: rows.len(),
                items: normalizer.mined_blocks(rows, kind)?,
            })
        }
    }

    fn token_query(
        &self,
        address: &Address,
        standard: TokenStandard,
        range: BlockRange,
        label: &'static str,
    ) -> impl Future<Output = TracerResult<Page<Token>>> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let normalizer = self.normalizer(address);
        async move {
            let rows = provider
                .fetch_token_transfers(normalizer.owner(), standard, range)
                .await?;
            log::debug!("{}: {} rows from {}", label, rows.len(), provider.provider_name());
            let fetched = rows.len();
            let items = match standard {
                TokenStandard::Fungible => normalizer.fungibles(rows)?,
                TokenStandard::NonFungible => normalizer.non_fungibles(rows)?,
            };
            Ok(Page {
                label,
                fetched,
                items,
            })
        }
    }

    /// The four native-event queries shared by history and balance
    fn spawn_event_queries<T: Send + 'static>(
        &self,
        fan: &mut FanOut<T>,
        address: &Address,
        range: BlockRange,
        wrap: fn(Page<Event>) -> T,
    ) {
        let standard = self.transfers_query(address, range, TransferKind::Standard, "txlist");
        fan.spawn("txlist", async move { standard.await.map(wrap) });

        let internal =
            self.transfers_query(address, range, TransferKind::Internal, "txlistinternal");
        fan.spawn("txlistinternal", async move { internal.await.map(wrap) });

        let regular = self.mined_blocks_query(address, MinedBlockKind::Regular, "minedblocks");
        fan.spawn("minedblocks", async move { regular.await.map(wrap) });

        let uncle = self.mined_blocks_query(address, MinedBlockKind::Uncle, "mineduncles");
        fan.spawn("mineduncles", async move { uncle.await.map(wrap) });
    }

    /// Both token-standard queries
    fn spawn_token_queries<T: Send + 'static>(
        &self,
        fan: &mut FanOut<T>,
        address: &Address,
        range: BlockRange,
        delay: std::time::Duration,
        wrap: fn(Page<Token>) -> T,
    ) {
        let fungible = self.token_query(address, TokenStandard::Fungible, range, "tokentx");
        fan.spawn("tokentx", async move {
            settle(delay).await;
            fungible.await.map(wrap)
        });

        let non_fungible =
            self.token_query(address, TokenStandard::NonFungible, range, "tokennfttx");
        fan.spawn("tokennfttx", async move {
            settle(delay).await;
            non_fungible.await.map(wrap)
        });
    }
}

async fn settle(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
