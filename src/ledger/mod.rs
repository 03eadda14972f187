//! Ledger model - addresses, amounts, events, tokens and their reports
//!
//! # Data flow
//!
//! ```text
//! Raw provider rows → Normalizer (owner + label + scaled amounts)
//!     ↓
//! Event (Transfer | MiningReward)    Token (Fungible | NonFungible)
//!     ↓                                   ↓
//! effect() / report()                effect() / fee() / report()
//! ```

pub mod address;
pub mod event;
pub mod normalizer;
pub mod report;
pub mod scaler;
pub mod token;

pub use address::Address;
pub use event::{Direction, Event, MinedBlockKind, MiningReward, Transfer, TransferKind};
pub use normalizer::{AmountPolicy, Normalizer};
pub use report::{Annotated, BalanceReport, Holding, TokenBreakdown};
pub use scaler::{scale, ScaleError, NATIVE_DECIMALS};
pub use token::{FungibleTransfer, NonFungibleTransfer, Token, TokenStandard};
