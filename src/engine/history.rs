//! Transaction and token-transfer history reports

use super::{FanOut, Page, Tracer};
use crate::error::TracerResult;
use crate::ledger::report::{render_events, render_tokens};
use crate::ledger::{Address, Annotated, Event, Token};
use crate::provider::BlockRange;
use std::time::Duration;

impl Tracer {
    /// Native transfers since `from_block` and all mining rewards, newest first
    ///
    /// Invalid transfers (failed, zero-value, missing endpoint) are left out.
    /// Returns `["No transactions found"]` when nothing remains.
    pub async fn transaction_history(
        &self,
        address: &Address,
        from_block: u64,
    ) -> TracerResult<Annotated<Vec<String>>> {
        log::info!("📜 History for {} from block {}", address, from_block);

        let mut fan: FanOut<Page<Event>> = FanOut::new(4);
        self.spawn_event_queries(&mut fan, address, BlockRange::starting_at(from_block), |p| p);
        let pages = fan.collect().await?;

        let incomplete = pages.iter().fold(false, |acc, p| self.hits_page_cap(p) || acc);
        let events: Vec<Event> = pages.into_iter().flat_map(|p| p.items).collect();
        log::debug!("Merged {} events for {}", events.len(), address);

        Ok(Annotated::new(render_events(events), incomplete))
    }

    /// ERC-20 and ERC-721 transfers since `from_block`, both directions, newest first
    pub async fn token_history(
        &self,
        address: &Address,
        from_block: u64,
    ) -> TracerResult<Annotated<Vec<String>>> {
        log::info!("🪙 Token history for {} from block {}", address, from_block);

        let mut fan: FanOut<Page<Token>> = FanOut::new(2);
        self.spawn_token_queries(
            &mut fan,
            address,
            BlockRange::starting_at(from_block),
            Duration::ZERO,
            |p| p,
        );
        let pages = fan.collect().await?;

        let incomplete = pages.iter().fold(false, |acc, p| self.hits_page_cap(p) || acc);
        let tokens: Vec<Token> = pages.into_iter().flat_map(|p| p.items).collect();
        log::debug!("Merged {} token transfers for {}", tokens.len(), address);

        Ok(Annotated::new(render_tokens(tokens), incomplete))
    }
}
