//! Native-currency ledger events
//!
//! `Event` unifies plain/internal transfers and mining rewards behind one
//! capability set (report, effect, block, time, validity) so the engine can
//! merge and sum them without caring which query produced them.

use super::address::Address;
use super::report::minute_stamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    Standard,
    Internal,
}

impl TransferKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransferKind::Standard => "REGULAR",
            TransferKind::Internal => "INTERNAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinedBlockKind {
    Regular,
    Uncle,
}

impl MinedBlockKind {
    pub fn label(&self) -> &'static str {
        match self {
            MinedBlockKind::Regular => "REGULAR",
            MinedBlockKind::Uncle => "UNCLE",
        }
    }
}

/// Which side of a record the owning address is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
    Unrelated,
}

impl Direction {
    /// Incoming wins when the owner is on both sides
    pub fn of(owner: &Address, from: &str, to: &str) -> Self {
        if owner.matches(to) {
            Direction::Incoming
        } else if owner.matches(from) {
            Direction::Outgoing
        } else {
            Direction::Unrelated
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub(crate) owner: Address,
    pub(crate) kind: TransferKind,
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) value: f64,
    pub(crate) gas_price: f64,
    pub(crate) gas_used: u64,
    pub(crate) is_error: bool,
    pub(crate) block: u64,
    pub(crate) timestamp: i64,
}

impl Transfer {
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Gas cost in native currency
    pub fn gas_cost(&self) -> f64 {
        self.gas_price * self.gas_used as f64
    }

    pub fn direction(&self) -> Direction {
        Direction::of(&self.owner, &self.from, &self.to)
    }

    pub fn is_valid(&self) -> bool {
        !(self.is_error || self.value == 0.0 || self.from.is_empty() || self.to.is_empty())
    }

    /// Failed or empty sends still pay for gas
    pub fn effect(&self) -> f64 {
        match self.direction() {
            Direction::Incoming if self.is_valid() => self.value,
            Direction::Incoming => 0.0,
            Direction::Outgoing if self.is_valid() => -self.value - self.gas_cost(),
            Direction::Outgoing => -self.gas_cost(),
            Direction::Unrelated => 0.0,
        }
    }

    pub fn report(&self) -> String {
        let counterparty = match self.direction() {
            Direction::Incoming => format!("RECEIVED FROM {}", self.from),
            _ => format!("SENT TO {}", self.to),
        };
        format!(
            "{} : {} = {} ETH ; {} TRANSACTION",
            minute_stamp(self.timestamp),
            counterparty,
            self.value,
            self.kind.label()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MiningReward {
    pub(crate) owner: Address,
    pub(crate) kind: MinedBlockKind,
    pub(crate) reward: f64,
    pub(crate) block: u64,
    pub(crate) timestamp: i64,
}

impl MiningReward {
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn kind(&self) -> MinedBlockKind {
        self.kind
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn report(&self) -> String {
        format!(
            "{} : {} ETH AS {} MINING AWARD",
            minute_stamp(self.timestamp),
            self.reward,
            self.kind.label()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Transfer(Transfer),
    MiningReward(MiningReward),
}

impl Event {
    pub fn report(&self) -> String {
        match self {
            Event::Transfer(t) => t.report(),
            Event::MiningReward(m) => m.report(),
        }
    }

    /// Signed native-currency impact on the owning address
    pub fn effect(&self) -> f64 {
        match self {
            Event::Transfer(t) => t.effect(),
            Event::MiningReward(m) => m.reward,
        }
    }

    pub fn block(&self) -> u64 {
        match self {
            Event::Transfer(t) => t.block,
            Event::MiningReward(m) => m.block,
        }
    }

    pub fn time(&self) -> i64 {
        match self {
            Event::Transfer(t) => t.timestamp,
            Event::MiningReward(m) => m.timestamp,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Event::Transfer(t) => t.is_valid(),
            Event::MiningReward(_) => true,
        }
    }

    pub fn owner(&self) -> &Address {
        match self {
            Event::Transfer(t) => &t.owner,
            Event::MiningReward(m) => &m.owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0xOwner";
    const OTHER: &str = "0xother";

    fn create_test_transfer(from: &str, to: &str, value: f64, is_error: bool) -> Transfer {
        Transfer {
            owner: Address::new(OWNER),
            kind: TransferKind::Standard,
            from: from.to_string(),
            to: to.to_string(),
            value,
            gas_price: 0.00000002,
            gas_used: 21000,
            is_error,
            block: 100,
            timestamp: 1654646411,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_outgoing_valid_pays_value_and_gas() {
        let tx = create_test_transfer(OWNER, OTHER, 2.0, false);
        assert_eq!(tx.direction(), Direction::Outgoing);
        assert_close(tx.effect(), -2.00042);
    }

    #[test]
    fn test_outgoing_failed_pays_gas_only() {
        let tx = create_test_transfer(OWNER, OTHER, 2.0, true);
        assert!(!tx.is_valid());
        assert_close(tx.effect(), -(0.00000002 * 21000.0));
    }

    #[test]
    fn test_incoming_with_empty_sender_has_no_effect() {
        let tx = create_test_transfer("", OWNER, 3.0, false);
        assert!(!tx.is_valid());
        assert_eq!(tx.effect(), 0.0);
    }

    #[test]
    fn test_incoming_valid() {
        let tx = create_test_transfer(OTHER, OWNER, 1.5, false);
        assert_eq!(tx.effect(), 1.5);
    }

    #[test]
    fn test_owner_matched_case_insensitively() {
        let tx = create_test_transfer(OTHER, "0xOWNER", 1.5, false);
        assert_eq!(tx.direction(), Direction::Incoming);
        assert_eq!(tx.effect(), 1.5);
    }

    #[test]
    fn test_zero_value_outgoing_is_fee_only() {
        let tx = create_test_transfer(OWNER, OTHER, 0.0, false);
        assert!(!tx.is_valid());
        assert_close(tx.effect(), -0.00042);
    }

    #[test]
    fn test_unrelated_transfer_has_no_effect() {
        let tx = create_test_transfer("0xa", "0xb", 5.0, false);
        assert_eq!(tx.direction(), Direction::Unrelated);
        assert_eq!(tx.effect(), 0.0);
    }

    #[test]
    fn test_transfer_report() {
        let tx = create_test_transfer(OTHER, OWNER, 1.5, false);
        assert_eq!(
            tx.report(),
            "2022-06-08 00:00 : RECEIVED FROM 0xother = 1.5 ETH ; REGULAR TRANSACTION"
        );

        let sent = create_test_transfer(OWNER, OTHER, 2.0, false);
        assert_eq!(
            sent.report(),
            "2022-06-08 00:00 : SENT TO 0xother = 2 ETH ; REGULAR TRANSACTION"
        );
    }

    #[test]
    fn test_mining_reward_always_valid() {
        let event = Event::MiningReward(MiningReward {
            owner: Address::new(OWNER),
            kind: MinedBlockKind::Uncle,
            reward: 1.875,
            block: 7,
            timestamp: 1654646411,
        });
        assert!(event.is_valid());
        assert_eq!(event.effect(), 1.875);
        assert_eq!(event.block(), 7);
        assert_eq!(
            event.report(),
            "2022-06-08 00:00 : 1.875 ETH AS UNCLE MINING AWARD"
        );
    }
}
