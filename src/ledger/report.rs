//! Report rendering: time ordering, line formatting and result envelopes

use super::event::{Direction, Event};
use super::scaler::scale;
use super::token::{FungibleTransfer, Token};
use chrono::DateTime;
use std::collections::BTreeMap;
use std::fmt;

pub const NO_TRANSACTIONS: &str = "No transactions found";
pub const NO_TOKENS: &str = "No tokens found";
pub const INCOMPLETE_PREFIX: &str = "Might be incorrect : ";

/// UTC timestamp truncated to the minute, e.g. `2022-06-08 00:00`
pub fn minute_stamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => timestamp.to_string(),
    }
}

/// Newest first; equal timestamps keep their merge order
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| b.time().cmp(&a.time()));
}

pub fn sort_tokens(tokens: &mut [Token]) {
    tokens.sort_by(|a, b| b.time().cmp(&a.time()));
}

/// Valid events only, newest first, or the empty-history sentinel
pub fn render_events(mut events: Vec<Event>) -> Vec<String> {
    events.retain(Event::is_valid);
    sort_events(&mut events);
    let lines: Vec<String> = events.iter().map(Event::report).collect();
    or_sentinel(lines, NO_TRANSACTIONS)
}

/// Every token transfer in both directions, newest first
pub fn render_tokens(mut tokens: Vec<Token>) -> Vec<String> {
    sort_tokens(&mut tokens);
    let lines: Vec<String> = tokens.iter().map(Token::report).collect();
    or_sentinel(lines, NO_TRANSACTIONS)
}

fn or_sentinel(lines: Vec<String>, sentinel: &str) -> Vec<String> {
    if lines.is_empty() {
        vec![sentinel.to_string()]
    } else {
        lines
    }
}

/// A successful result plus the page-cap warning
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated<T> {
    pub value: T,
    /// At least one contributing query returned a full page
    pub incomplete: bool,
}

impl<T> Annotated<T> {
    pub fn new(value: T, incomplete: bool) -> Self {
        Self { value, incomplete }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Annotated<U> {
        Annotated {
            value: f(self.value),
            incomplete: self.incomplete,
        }
    }
}

/// Reconstructed native balance
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub balance: f64,
    pub incomplete: bool,
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.incomplete {
            f.write_str(INCOMPLETE_PREFIX)?;
        }
        write!(f, "ETH = {}", self.balance)
    }
}

/// Running total for one breakdown key
///
/// ERC-20 amounts are summed in base units and scaled once when read, so a
/// position that was fully sold again is exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holding {
    /// ERC-20 base units and the token's decimals
    Units { raw: i128, decimals: u32 },
    /// ERC-721 token count
    Count(i64),
}

impl Holding {
    /// Change in holdings caused by one transfer
    pub fn of(token: &Token) -> Self {
        let sign: i128 = match token.direction() {
            Direction::Incoming => 1,
            _ => -1,
        };
        match token {
            Token::Fungible(t) => Holding::Units {
                raw: sign * base_units(t),
                decimals: t.decimals(),
            },
            Token::NonFungible(_) => Holding::Count(sign as i64),
        }
    }

    fn add(&mut self, delta: Holding) {
        match (self, delta) {
            (Holding::Units { raw, .. }, Holding::Units { raw: d, .. }) => {
                *raw = raw.saturating_add(d);
            }
            (Holding::Count(n), Holding::Count(d)) => *n += d,
            // Keys carry the token standard, so kinds never meet
            _ => {}
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Holding::Units { raw: 0, .. } | Holding::Count(0))
    }

    pub fn amount(&self) -> f64 {
        match *self {
            Holding::Units { raw, decimals } => {
                let magnitude = scale(&raw.unsigned_abs().to_string(), decimals).unwrap_or(0.0);
                if raw < 0 {
                    -magnitude
                } else {
                    magnitude
                }
            }
            Holding::Count(n) => n as f64,
        }
    }
}

impl fmt::Display for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount())
    }
}

/// Base units of a fungible transfer; malformed amounts count as zero
fn base_units(transfer: &FungibleTransfer) -> i128 {
    let raw = transfer.raw_value().trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    match raw.parse::<i128>() {
        Ok(units) => units,
        Err(_) => {
            log::warn!("⚠️  Token amount {} exceeds the supported range; counting 0", raw);
            0
        }
    }
}

/// Per-token balances keyed by `"<standard> <name-or-contract>"`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBreakdown {
    pub balances: BTreeMap<String, Holding>,
    pub incomplete: bool,
}

impl TokenBreakdown {
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token>, incomplete: bool) -> Self {
        let mut balances: BTreeMap<String, Holding> = BTreeMap::new();
        for token in tokens {
            let delta = Holding::of(token);
            balances
                .entry(token.breakdown_key())
                .and_modify(|held| held.add(delta))
                .or_insert(delta);
        }
        Self {
            balances,
            incomplete,
        }
    }

    /// Non-zero holdings as `"<key> = <amount>"`, in key order
    pub fn lines(&self) -> Vec<String> {
        let lines: Vec<String> = self
            .balances
            .iter()
            .filter(|(_, held)| !held.is_zero())
            .map(|(key, held)| format!("{} = {}", key, held))
            .collect();
        or_sentinel(lines, NO_TOKENS)
    }
}
