//! Raw provider rows to owned `Event`/`Token` values
//!
//! This is the only place the owning address and sub-type label are attached
//! and the only place amounts are scaled. Everything the provider returns
//! passes through here before it reaches the coordinator.

use super::address::Address;
use super::event::{Event, MinedBlockKind, MiningReward, Transfer, TransferKind};
use super::scaler::{scale, NATIVE_DECIMALS};
use super::token::{FungibleTransfer, NonFungibleTransfer, Token, TokenTransferBase};
use crate::error::TracerResult;
use crate::provider::records::{RawMinedBlock, RawTokenTransfer, RawTransfer};

/// What to do with an amount string that is not a plain integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountPolicy {
    /// Substitute zero and log a warning
    #[default]
    Tolerant,
    /// Fail the request with `MalformedAmount`
    Strict,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    owner: Address,
    policy: AmountPolicy,
}

impl Normalizer {
    pub fn new(owner: Address, policy: AmountPolicy) -> Self {
        Self { owner, policy }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    fn amount(&self, raw: &str, decimals: u32) -> TracerResult<f64> {
        match scale(raw, decimals) {
            Ok(value) => Ok(value),
            Err(e) => match self.policy {
                AmountPolicy::Strict => Err(e.into()),
                AmountPolicy::Tolerant => {
                    log::warn!("⚠️  {} for {}; substituting 0", e, self.owner);
                    Ok(0.0)
                }
            },
        }
    }

    /// Scale a wei string (e.g. a balance) under the same policy
    pub fn native(&self, raw: &str) -> TracerResult<f64> {
        self.amount(raw, NATIVE_DECIMALS)
    }

    pub fn transfer(&self, raw: RawTransfer, kind: TransferKind) -> TracerResult<Event> {
        let value = self.amount(&raw.value, NATIVE_DECIMALS)?;
        let gas_price = self.amount(&raw.gas_price, NATIVE_DECIMALS)?;
        Ok(Event::Transfer(Transfer {
            owner: self.owner.clone(),
            kind,
            from: raw.from,
            to: raw.to,
            value,
            gas_price,
            gas_used: raw.gas_used,
            is_error: raw.is_error == 1,
            block: raw.block_number,
            timestamp: raw.time_stamp,
        }))
    }

    pub fn mined_block(&self, raw: RawMinedBlock, kind: MinedBlockKind) -> TracerResult<Event> {
        let reward = self.amount(&raw.block_reward, NATIVE_DECIMALS)?;
        Ok(Event::MiningReward(MiningReward {
            owner: self.owner.clone(),
            kind,
            reward,
            block: raw.block_number,
            timestamp: raw.time_stamp,
        }))
    }

    pub fn fungible(&self, raw: RawTokenTransfer) -> TracerResult<Token> {
        let value = self.amount(&raw.value, raw.token_decimal)?;
        let decimals = raw.token_decimal;
        let raw_value = raw.value.clone();
        let base = self.token_base(raw)?;
        Ok(Token::Fungible(FungibleTransfer {
            base,
            decimals,
            raw_value,
            value,
        }))
    }

    pub fn non_fungible(&self, raw: RawTokenTransfer) -> TracerResult<Token> {
        let token_id = raw.token_id.clone();
        let base = self.token_base(raw)?;
        Ok(Token::NonFungible(NonFungibleTransfer { base, token_id }))
    }

    fn token_base(&self, raw: RawTokenTransfer) -> TracerResult<TokenTransferBase> {
        let gas_price = self.amount(&raw.gas_price, NATIVE_DECIMALS)?;
        Ok(TokenTransferBase {
            owner: self.owner.clone(),
            from: raw.from,
            to: raw.to,
            contract: raw.contract_address,
            name: raw.token_name,
            symbol: raw.token_symbol,
            gas_price,
            gas_used: raw.gas_used,
            block: raw.block_number,
            timestamp: raw.time_stamp,
        })
    }

    pub fn transfers(&self, rows: Vec<RawTransfer>, kind: TransferKind) -> TracerResult<Vec<Event>> {
        rows.into_iter().map(|raw| self.transfer(raw, kind)).collect()
    }

    pub fn mined_blocks(
        &self,
        rows: Vec<RawMinedBlock>,
        kind: MinedBlockKind,
    ) -> TracerResult<Vec<Event>> {
        rows.into_iter().map(|raw| self.mined_block(raw, kind)).collect()
    }

    pub fn fungibles(&self, rows: Vec<RawTokenTransfer>) -> TracerResult<Vec<Token>> {
        rows.into_iter().map(|raw| self.fungible(raw)).collect()
    }

    pub fn non_fungibles(&self, rows: Vec<RawTokenTransfer>) -> TracerResult<Vec<Token>> {
        rows.into_iter().map(|raw| self.non_fungible(raw)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TracerError;

    fn raw_transfer(value: &str) -> RawTransfer {
        RawTransfer {
            hash: "0x1".to_string(),
            from: "0xsender".to_string(),
            to: "0xOwner".to_string(),
            block_number: 5,
            time_stamp: 1000,
            value: value.to_string(),
            gas_price: "20000000000".to_string(),
            gas_used: 21000,
            is_error: 0,
        }
    }

    #[test]
    fn test_transfer_scaled_and_owned() {
        let normalizer = Normalizer::new(Address::new("0xowner"), AmountPolicy::Tolerant);
        let event = normalizer
            .transfer(raw_transfer("1500000000000000000"), TransferKind::Internal)
            .unwrap();

        match &event {
            Event::Transfer(t) => {
                assert_eq!(t.value(), 1.5);
                assert_eq!(t.kind(), TransferKind::Internal);
                assert_eq!(t.owner(), &Address::new("0xOWNER"));
                assert!((t.gas_cost() - 0.00042).abs() < 1e-15);
            }
            other => panic!("expected transfer, got {:?}", other),
        }
        assert_eq!(event.effect(), 1.5);
    }

    #[test]
    fn test_tolerant_policy_zeroes_bad_amount() {
        let normalizer = Normalizer::new(Address::new("0xowner"), AmountPolicy::Tolerant);
        let event = normalizer
            .transfer(raw_transfer("0x14d1120d7b160000"), TransferKind::Standard)
            .unwrap();
        assert!(!event.is_valid());
    }

    #[test]
    fn test_strict_policy_fails_bad_amount() {
        let normalizer = Normalizer::new(Address::new("0xowner"), AmountPolicy::Strict);
        let err = normalizer
            .transfer(raw_transfer("12.5"), TransferKind::Standard)
            .unwrap_err();
        assert_eq!(
            err,
            TracerError::MalformedAmount {
                value: "12.5".to_string(),
                decimals: 18
            }
        );
    }

    #[test]
    fn test_fungible_uses_token_decimals() {
        let normalizer = Normalizer::new(Address::new("0xowner"), AmountPolicy::Strict);
        let raw = RawTokenTransfer {
            from: "0xowner".to_string(),
            to: "0xdex".to_string(),
            contract_address: "0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(),
            block_number: 9,
            time_stamp: 2000,
            token_name: "Tether USD".to_string(),
            token_symbol: "USDT".to_string(),
            token_decimal: 6,
            value: "2500000".to_string(),
            gas_price: "10000000000".to_string(),
            gas_used: 60000,
            ..Default::default()
        };

        let token = normalizer.fungible(raw).unwrap();
        assert_eq!(token.effect(), -2.5);
        assert_eq!(token.symbol(), "USDT");
        assert!((token.fee() + 0.0006).abs() < 1e-15);
    }

    #[test]
    fn test_mined_block_reward() {
        let normalizer = Normalizer::new(Address::new("0xminer"), AmountPolicy::Tolerant);
        let raw = RawMinedBlock {
            block_number: 46147,
            time_stamp: 1438923567,
            block_reward: "5000000000000000000".to_string(),
        };
        let event = normalizer.mined_block(raw, MinedBlockKind::Regular).unwrap();
        assert_eq!(event.effect(), 5.0);
        assert_eq!(event.block(), 46147);
    }
}
