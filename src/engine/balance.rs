//! Historical balances
//!
//! The provider only knows present balances. A past balance is the present
//! balance minus every effect recorded since the target block: transfer
//! values, gas, mining rewards and the gas paid for token transfers.
//! This is exact only while no contributing query hits the page cap.

use super::{settle, FanOut, Page, Tracer};
use crate::error::{TracerError, TracerResult};
use crate::ledger::{Address, BalanceReport, Event, Token, TokenBreakdown};
use crate::provider::BlockRange;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

/// Unix timestamp of 00:00 UTC on a `YYYY-MM-DD` day
pub fn parse_day(date: &str) -> TracerResult<i64> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| TracerError::InvalidDate(date.to_string()))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| TracerError::InvalidDate(date.to_string()))?;
    Ok(midnight.and_utc().timestamp())
}

/// Everything the two query waves of a reconstruction produce
enum Fetched {
    Events(Page<Event>),
    Tokens(Page<Token>),
    Balance(f64),
}

impl Tracer {
    /// Native balance of `address` at the start of `date` (UTC)
    ///
    /// # Arguments
    /// * `address` - Account to reconstruct
    /// * `date` - Calendar day, `YYYY-MM-DD`
    ///
    /// # Returns
    /// * `Ok(BalanceReport)` - Balance, flagged incomplete if any query hit the page cap
    /// * `Err(InvalidDate)` - Before any query is issued
    /// * `Err(...)` - First failure of any query; the others are cancelled
    pub async fn balance_at_date(
        &self,
        address: &Address,
        date: &str,
    ) -> TracerResult<BalanceReport> {
        let day_start = parse_day(date)?;
        let target = self.provider.fetch_block_at_or_after(day_start).await?;
        log::info!("⚖️  Balance of {} at {} (block {})", address, date, target);

        let range = BlockRange::starting_at(target);
        let delay = self.config.settle_delay;
        let mut fan: FanOut<Fetched> = FanOut::new(7);

        // Wave 1: native events
        self.spawn_event_queries(&mut fan, address, range, Fetched::Events);

        // Wave 2 waits out the provider's rate limit
        self.spawn_token_queries(&mut fan, address, range, delay, Fetched::Tokens);
        let provider = Arc::clone(&self.provider);
        let normalizer = self.normalizer(address);
        fan.spawn("balance", async move {
            settle(delay).await;
            let raw = provider.fetch_balance(normalizer.owner()).await?;
            Ok(Fetched::Balance(normalizer.native(&raw)?))
        });

        let results = fan.collect().await?;

        let mut incomplete = false;
        let mut since_target = 0.0;
        let mut present = None;
        for fetched in results {
            match fetched {
                Fetched::Events(page) => {
                    incomplete |= self.hits_page_cap(&page);
                    since_target += page
                        .items
                        .iter()
                        .filter(|e| e.block() >= target)
                        .map(Event::effect)
                        .sum::<f64>();
                }
                Fetched::Tokens(page) => {
                    incomplete |= self.hits_page_cap(&page);
                    since_target += page
                        .items
                        .iter()
                        .filter(|t| t.block() >= target)
                        .map(Token::fee)
                        .sum::<f64>();
                }
                Fetched::Balance(value) => present = Some(value),
            }
        }

        let present =
            present.ok_or_else(|| TracerError::AccountNotFound(address.to_string()))?;
        let balance = present - since_target;
        log::info!(
            "Balance of {}: present {} - effects since block {} {} = {}",
            address,
            present,
            target,
            since_target,
            balance
        );

        Ok(BalanceReport {
            balance,
            incomplete,
        })
    }

    /// Per-token balances accumulated up to the last block before `date`
    pub async fn token_balance_at_date(
        &self,
        address: &Address,
        date: &str,
    ) -> TracerResult<TokenBreakdown> {
        let day_start = parse_day(date)?;
        let target = self.provider.fetch_block_at_or_before(day_start).await?;
        log::info!("🪙 Token balances of {} at {} (block {})", address, date, target);

        let mut fan: FanOut<Page<Token>> = FanOut::new(2);
        self.spawn_token_queries(
            &mut fan,
            address,
            BlockRange::up_to(target),
            Duration::ZERO,
            |p| p,
        );
        let pages = fan.collect().await?;

        let incomplete = pages.iter().fold(false, |acc, p| self.hits_page_cap(p) || acc);
        let tokens: Vec<Token> = pages.into_iter().flat_map(|p| p.items).collect();
        Ok(TokenBreakdown::from_tokens(&tokens, incomplete))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day("2022-06-08").unwrap(), 1654646400);
        assert_eq!(parse_day(" 1970-01-01 ").unwrap(), 0);
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        for bad in ["", "2022-13-01", "08/06/2022", "2022-06-08T10:00:00"] {
            assert_eq!(
                parse_day(bad).unwrap_err(),
                TracerError::InvalidDate(bad.to_string())
            );
        }
    }
}
