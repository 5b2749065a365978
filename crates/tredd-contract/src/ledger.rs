//! The ledger seam.
//!
//! Everything the protocol needs from a chain: deploy a contract, query its
//! state, and submit the four guarded calls. Implementations decide how
//! calls are authenticated and mined; the in-process [`crate::MemoryLedger`]
//! trusts its callers and settles immediately.

use async_trait::async_trait;

use crate::contract::{Address, ContractParams, ContractSnapshot, FraudClaim};
use crate::error::LedgerResult;

/// Opaque identifier of a deployed contract.
pub type ContractId = [u8; 32];

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Deploy a contract funded with the buyer's payment.
    async fn deploy(
        &self,
        caller: Address,
        params: ContractParams,
        payment: u64,
    ) -> LedgerResult<ContractId>;

    /// Current state of a contract, including the key once revealed.
    async fn snapshot(&self, id: &ContractId) -> LedgerResult<ContractSnapshot>;

    /// Seller reveals the key, depositing collateral.
    async fn reveal(
        &self,
        id: &ContractId,
        caller: Address,
        key: [u8; 32],
        collateral: u64,
    ) -> LedgerResult<()>;

    /// Buyer reclaims payment after the reveal deadline passed unanswered.
    async fn cancel(&self, id: &ContractId, caller: Address) -> LedgerResult<()>;

    /// Buyer submits a fraud claim for payment plus collateral.
    async fn refund(&self, id: &ContractId, caller: Address, claim: FraudClaim)
        -> LedgerResult<()>;

    /// Seller collects payment plus collateral after the refund window.
    async fn claim(&self, id: &ContractId, caller: Address) -> LedgerResult<()>;

    /// The chain clock, milliseconds since the epoch. Deadline decisions key
    /// off this, not the caller's wall clock.
    fn now_ms(&self) -> u64;
}
