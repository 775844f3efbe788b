//! Multi-signature custody and virtual-address asset management.
//!
//! A holder registers management keys with per-key spending ceilings and
//! multi-party approval thresholds, derives deterministic per-user and
//! per-category deposit addresses, moves funds between those addresses and
//! its main address under permission checks, and processes withdrawals that
//! require threshold approval within a fixed expiry window. Token balances
//! live in an external ledger reached through the [`TokenLedger`] trait; the
//! hosting environment supplies callers, time and transaction identity
//! through [`ExecutionContext`].

pub mod address;
pub mod context;
pub mod derive;
pub mod engine;
pub mod error;
pub mod events;
pub mod hash;
pub mod holder;
pub mod ledger;
pub mod permission;
pub mod whitelist;
pub mod withdrawal;

pub use address::Address;
pub use context::{ExecutionContext, MockExecutionContext, VirtualCall};
pub use engine::{
    AssetMove, CancelWithdraws, CreateHolder, CustodyEngine, HolderUpdateRequest,
    VirtualAddressCalculation, VirtualTransaction, WithdrawApprove, WithdrawRequest,
};
pub use error::CustodyError;
pub use events::{CustodyEvent, EventSink, InMemoryEventSink};
pub use hash::{CategoryHash, HashDigest, HolderId, WithdrawId};
pub use holder::{HolderInfo, HolderUpdatingInfo, ManagementAddress};
pub use ledger::{InMemoryLedger, TokenInfo, TokenLedger};
pub use whitelist::{ContractCallWhiteList, CustodyInfo, WhitelistRegistry};
pub use withdrawal::{WithdrawApproval, WithdrawInfo, WITHDRAW_EXPIRATION_SECS};
