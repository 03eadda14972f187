//! In-memory provider serving canned rows
//!
//! Used by the test suite and for offline runs of the engine. Individual
//! queries can be made to fail, to answer late, or to never answer at all;
//! queries dropped before they answer are recorded as abandoned so callers
//! can observe cancellation.

use super::records::{RawMinedBlock, RawTokenTransfer, RawTransfer};
use super::{BlockRange, LedgerProvider};
use crate::error::{TracerError, TracerResult};
use crate::ledger::{Address, MinedBlockKind, TokenStandard, TransferKind};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// One kind of provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Transfers(TransferKind),
    MinedBlocks(MinedBlockKind),
    TokenTransfers(TokenStandard),
    BlockAtOrBefore,
    BlockAtOrAfter,
    Balance,
}

#[derive(Default)]
pub struct FixtureProvider {
    transfers: HashMap<TransferKind, Vec<RawTransfer>>,
    mined: HashMap<MinedBlockKind, Vec<RawMinedBlock>>,
    tokens: HashMap<TokenStandard, Vec<RawTokenTransfer>>,
    /// (block number, timestamp), ascending
    blocks: Vec<(u64, i64)>,
    balance: Option<String>,
    failures: HashMap<Query, TracerError>,
    latency: HashMap<Query, Duration>,
    stalled: HashSet<Query>,
    calls: Mutex<Vec<Query>>,
    abandoned: Mutex<Vec<Query>>,
    abandoned_signal: Notify,
}

struct CallGuard<'a> {
    provider: &'a FixtureProvider,
    query: Query,
    answered: bool,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.answered {
            if let Ok(mut abandoned) = self.provider.abandoned.lock() {
                abandoned.push(self.query);
            }
            self.provider.abandoned_signal.notify_one();
        }
    }
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transfers(mut self, kind: TransferKind, rows: Vec<RawTransfer>) -> Self {
        self.transfers.insert(kind, rows);
        self
    }

    pub fn with_mined_blocks(mut self, kind: MinedBlockKind, rows: Vec<RawMinedBlock>) -> Self {
        self.mined.insert(kind, rows);
        self
    }

    pub fn with_token_transfers(
        mut self,
        standard: TokenStandard,
        rows: Vec<RawTokenTransfer>,
    ) -> Self {
        self.tokens.insert(standard, rows);
        self
    }

    /// Register a block and its timestamp for date lookups
    pub fn with_block(mut self, number: u64, timestamp: i64) -> Self {
        self.blocks.push((number, timestamp));
        self.blocks.sort_by_key(|(_, ts)| *ts);
        self
    }

    /// Present balance in wei
    pub fn with_balance(mut self, wei: impl Into<String>) -> Self {
        self.balance = Some(wei.into());
        self
    }

    pub fn failing(mut self, query: Query, error: TracerError) -> Self {
        self.failures.insert(query, error);
        self
    }

    pub fn delayed(mut self, query: Query, latency: Duration) -> Self {
        self.latency.insert(query, latency);
        self
    }

    /// The query never answers; it only ends when its caller drops it
    pub fn stalled(mut self, query: Query) -> Self {
        self.stalled.insert(query);
        self
    }

    /// Every call received so far, in arrival order
    pub fn calls(&self) -> Vec<Query> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls dropped before they produced an answer
    pub fn abandoned(&self) -> Vec<Query> {
        self.abandoned.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Resolves once some call has been abandoned
    pub async fn wait_abandoned(&self) {
        self.abandoned_signal.notified().await;
    }

    async fn begin(&self, query: Query) -> TracerResult<CallGuard<'_>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query);
        }
        let mut guard = CallGuard {
            provider: self,
            query,
            answered: false,
        };

        if let Some(latency) = self.latency.get(&query) {
            tokio::time::sleep(*latency).await;
        }
        if self.stalled.contains(&query) {
            std::future::pending::<()>().await;
        }
        if let Some(error) = self.failures.get(&query) {
            guard.answered = true;
            return Err(error.clone());
        }
        Ok(guard)
    }
}

impl CallGuard<'_> {
    fn answer<T>(mut self, value: T) -> T {
        self.answered = true;
        value
    }
}

#[async_trait]
impl LedgerProvider for FixtureProvider {
    async fn fetch_transfers(
        &self,
        _address: &Address,
        range: BlockRange,
        kind: TransferKind,
    ) -> TracerResult<Vec<RawTransfer>> {
        let guard = self.begin(Query::Transfers(kind)).await?;
        let mut rows: Vec<RawTransfer> = self
            .transfers
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .filter(|r| range.contains(r.block_number))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        Ok(guard.answer(rows))
    }

    async fn fetch_mined_blocks(
        &self,
        _address: &Address,
        kind: MinedBlockKind,
    ) -> TracerResult<Vec<RawMinedBlock>> {
        let guard = self.begin(Query::MinedBlocks(kind)).await?;
        let rows = self.mined.get(&kind).cloned().unwrap_or_default();
        Ok(guard.answer(rows))
    }

    async fn fetch_token_transfers(
        &self,
        _address: &Address,
        standard: TokenStandard,
        range: BlockRange,
    ) -> TracerResult<Vec<RawTokenTransfer>> {
        let guard = self.begin(Query::TokenTransfers(standard)).await?;
        let mut rows: Vec<RawTokenTransfer> = self
            .tokens
            .get(&standard)
            .map(|rows| {
                rows.iter()
                    .filter(|r| range.contains(r.block_number))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        Ok(guard.answer(rows))
    }

    async fn fetch_block_at_or_before(&self, timestamp: i64) -> TracerResult<u64> {
        let guard = self.begin(Query::BlockAtOrBefore).await?;
        let found = self
            .blocks
            .iter()
            .rev()
            .find(|(_, ts)| *ts <= timestamp)
            .map(|(number, _)| *number);
        guard
            .answer(found)
            .ok_or(TracerError::BlockNotFound { timestamp })
    }

    async fn fetch_block_at_or_after(&self, timestamp: i64) -> TracerResult<u64> {
        let guard = self.begin(Query::BlockAtOrAfter).await?;
        let found = self
            .blocks
            .iter()
            .find(|(_, ts)| *ts >= timestamp)
            .map(|(number, _)| *number);
        guard
            .answer(found)
            .ok_or(TracerError::BlockNotFound { timestamp })
    }

    async fn fetch_balance(&self, address: &Address) -> TracerResult<String> {
        let guard = self.begin(Query::Balance).await?;
        guard
            .answer(self.balance.clone())
            .ok_or_else(|| TracerError::AccountNotFound(address.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "fixture"
    }
}
