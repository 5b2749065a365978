//! # tredd-contract: the fair-exchange state machine
//!
//! One contract instance escrows a single transfer: the buyer funds it with
//! the payment, the seller reveals the decryption key against collateral,
//! and the funds settle to exactly one party. The buyer wins on a proven
//! fraud claim or an expired reveal deadline; the seller wins once the
//! refund window closes.
//!
//! The machine itself ([`Contract`]) is pure and clocked explicitly: every
//! guarded call takes `now_ms`, succeeds atomically, or rejects without
//! state change. The [`Ledger`] trait is the adapter a deployment talks
//! through; [`MemoryLedger`] is the in-process implementation used by the
//! daemon's dev chain and by tests.

pub mod contract;
pub mod error;
pub mod ledger;
pub mod memory;

pub use contract::{
    Address, Contract, ContractParams, ContractSnapshot, ContractStatus, FraudClaim, Payout,
};
pub use error::{ContractError, LedgerError, LedgerResult};
pub use ledger::{ContractId, Ledger};
pub use memory::MemoryLedger;
