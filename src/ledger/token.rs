//! Token transfer records (ERC-20 and ERC-721)
//!
//! Token value never touches the native balance; only the gas the owner paid
//! to send a token does, which is what `Token::fee` reports.

use super::address::Address;
use super::event::Direction;
use super::report::minute_stamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStandard {
    Fungible,
    NonFungible,
}

impl TokenStandard {
    pub fn label(&self) -> &'static str {
        match self {
            TokenStandard::Fungible => "ERC20",
            TokenStandard::NonFungible => "ERC721",
        }
    }
}

/// Fields shared by both standards
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransferBase {
    pub(crate) owner: Address,
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) contract: String,
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) gas_price: f64,
    pub(crate) gas_used: u64,
    pub(crate) block: u64,
    pub(crate) timestamp: i64,
}

impl TokenTransferBase {
    fn direction(&self) -> Direction {
        Direction::of(&self.owner, &self.from, &self.to)
    }

    fn counterparty(&self) -> (&'static str, &str) {
        match self.direction() {
            Direction::Incoming => ("RECEIVED FROM", &self.from),
            _ => ("SENT TO", &self.to),
        }
    }

    fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.contract
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FungibleTransfer {
    pub(crate) base: TokenTransferBase,
    pub(crate) decimals: u32,
    pub(crate) raw_value: String,
    pub(crate) value: f64,
}

impl FungibleTransfer {
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NonFungibleTransfer {
    pub(crate) base: TokenTransferBase,
    pub(crate) token_id: String,
}

impl NonFungibleTransfer {
    pub fn token_id(&self) -> &str {
        &self.token_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Fungible(FungibleTransfer),
    NonFungible(NonFungibleTransfer),
}

impl Token {
    fn base(&self) -> &TokenTransferBase {
        match self {
            Token::Fungible(t) => &t.base,
            Token::NonFungible(t) => &t.base,
        }
    }

    pub fn standard(&self) -> TokenStandard {
        match self {
            Token::Fungible(_) => TokenStandard::Fungible,
            Token::NonFungible(_) => TokenStandard::NonFungible,
        }
    }

    pub fn owner(&self) -> &Address {
        &self.base().owner
    }

    pub fn contract(&self) -> &str {
        &self.base().contract
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn symbol(&self) -> &str {
        &self.base().symbol
    }

    /// Token name, or the contract address when the provider has none
    pub fn display_name(&self) -> &str {
        self.base().display_name()
    }

    pub fn block(&self) -> u64 {
        self.base().block
    }

    pub fn time(&self) -> i64 {
        self.base().timestamp
    }

    pub fn direction(&self) -> Direction {
        self.base().direction()
    }

    /// Token amount moved relative to the owner; a unit count for ERC-721
    pub fn effect(&self) -> f64 {
        let amount = match self {
            Token::Fungible(t) => t.value,
            Token::NonFungible(_) => 1.0,
        };
        match self.direction() {
            Direction::Incoming => amount,
            _ => -amount,
        }
    }

    /// Native-currency gas cost paid by the owner
    pub fn fee(&self) -> f64 {
        let base = self.base();
        if base.owner.matches(&base.from) {
            -(base.gas_price * base.gas_used as f64)
        } else {
            0.0
        }
    }

    /// Grouping key for per-token balances, e.g. `ERC20 Tether USD`
    pub fn breakdown_key(&self) -> String {
        format!("{} {}", self.standard().label(), self.display_name())
    }

    pub fn report(&self) -> String {
        let base = self.base();
        let (phrase, counterparty) = base.counterparty();
        match self {
            Token::Fungible(t) => format!(
                "{} : {} {} = {} {} ERC20 TOKENS",
                minute_stamp(base.timestamp),
                phrase,
                counterparty,
                t.value,
                base.display_name()
            ),
            Token::NonFungible(t) => format!(
                "{} : {} {} : {} ID {} ERC721 TOKEN",
                minute_stamp(base.timestamp),
                phrase,
                counterparty,
                t.token_id,
                base.display_name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0xowner";

    fn create_test_base(from: &str, to: &str, name: &str) -> TokenTransferBase {
        TokenTransferBase {
            owner: Address::new(OWNER),
            from: from.to_string(),
            to: to.to_string(),
            contract: "0xcontract".to_string(),
            name: name.to_string(),
            symbol: "TKN".to_string(),
            gas_price: 0.00000004,
            gas_used: 50000,
            block: 10,
            timestamp: 1654646411,
        }
    }

    fn fungible(from: &str, to: &str, value: f64) -> Token {
        Token::Fungible(FungibleTransfer {
            base: create_test_base(from, to, "Token"),
            decimals: 6,
            raw_value: String::new(),
            value,
        })
    }

    fn non_fungible(from: &str, to: &str, name: &str) -> Token {
        Token::NonFungible(NonFungibleTransfer {
            base: create_test_base(from, to, name),
            token_id: "202106".to_string(),
        })
    }

    #[test]
    fn test_fungible_effect_sign() {
        assert_eq!(fungible("0xa", OWNER, 12.5).effect(), 12.5);
        assert_eq!(fungible(OWNER, "0xa", 12.5).effect(), -12.5);
    }

    #[test]
    fn test_fee_only_for_sender() {
        let sent = fungible(OWNER, "0xa", 12.5);
        assert!((sent.fee() + 0.002).abs() < 1e-12);
        assert_eq!(fungible("0xa", OWNER, 12.5).fee(), 0.0);
    }

    #[test]
    fn test_non_fungible_counts_units() {
        assert_eq!(non_fungible("0xa", OWNER, "Kitty").effect(), 1.0);
        assert_eq!(non_fungible(OWNER, "0xa", "Kitty").effect(), -1.0);
        assert!(non_fungible(OWNER, "0xa", "Kitty").fee() < 0.0);
    }

    #[test]
    fn test_name_falls_back_to_contract() {
        let unnamed = non_fungible("0xa", OWNER, "");
        assert_eq!(unnamed.display_name(), "0xcontract");
        assert_eq!(unnamed.breakdown_key(), "ERC721 0xcontract");
        assert_eq!(
            unnamed.report(),
            "2022-06-08 00:00 : RECEIVED FROM 0xa : 202106 ID 0xcontract ERC721 TOKEN"
        );
    }

    #[test]
    fn test_fungible_report() {
        assert_eq!(
            fungible(OWNER, "0xb", 3.25).report(),
            "2022-06-08 00:00 : SENT TO 0xb = 3.25 Token ERC20 TOKENS"
        );
    }
}
