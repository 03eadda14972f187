//! Ledger data providers
//!
//! The engine only talks to the `LedgerProvider` trait. `EtherscanProvider`
//! is the HTTP implementation; `FixtureProvider` serves canned rows from
//! memory for tests and offline runs.
//!
//! A provider answers "no records" with an empty list. `BlockNotFound` and
//! `AccountNotFound` are reserved for lookups that must produce a value.

pub mod etherscan;
pub mod fixture;
pub mod records;

use crate::error::TracerResult;
use crate::ledger::{Address, MinedBlockKind, TokenStandard, TransferKind};
use async_trait::async_trait;

pub use etherscan::{EtherscanConfig, EtherscanProvider};
pub use records::{RawMinedBlock, RawTokenTransfer, RawTransfer};

/// Inclusive block range; `to == None` means up to the chain head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: Option<u64>,
}

impl BlockRange {
    pub fn starting_at(from: u64) -> Self {
        Self { from, to: None }
    }

    pub fn up_to(to: u64) -> Self {
        Self { from: 0, to: Some(to) }
    }

    pub fn contains(&self, block: u64) -> bool {
        block >= self.from && self.to.map_or(true, |to| block <= to)
    }
}

#[async_trait]
pub trait LedgerProvider: Send + Sync {
    async fn fetch_transfers(
        &self,
        address: &Address,
        range: BlockRange,
        kind: TransferKind,
    ) -> TracerResult<Vec<RawTransfer>>;

    async fn fetch_mined_blocks(
        &self,
        address: &Address,
        kind: MinedBlockKind,
    ) -> TracerResult<Vec<RawMinedBlock>>;

    async fn fetch_token_transfers(
        &self,
        address: &Address,
        standard: TokenStandard,
        range: BlockRange,
    ) -> TracerResult<Vec<RawTokenTransfer>>;

    /// Last block mined at or before `timestamp`
    async fn fetch_block_at_or_before(&self, timestamp: i64) -> TracerResult<u64>;

    /// First block mined at or after `timestamp`
    async fn fetch_block_at_or_after(&self, timestamp: i64) -> TracerResult<u64>;

    /// Present balance in wei
    async fn fetch_balance(&self, address: &Address) -> TracerResult<String>;

    /// Name used in logs
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_range() {
        let range = BlockRange::starting_at(100);
        assert!(!range.contains(99));
        assert!(range.contains(100));
        assert!(range.contains(u64::MAX));
    }

    #[test]
    fn test_closed_range_is_inclusive() {
        let range = BlockRange::up_to(50);
        assert!(range.contains(0));
        assert!(range.contains(50));
        assert!(!range.contains(51));
    }
}
