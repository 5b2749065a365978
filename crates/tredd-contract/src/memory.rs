//! In-process ledger backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::RngCore;

use crate::contract::{Address, Contract, ContractParams, ContractSnapshot, FraudClaim, Payout};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{ContractId, Ledger};

/// A single-process ledger holding contracts in memory.
///
/// Calls settle synchronously and callers are taken at their word; this is
/// a development chain, not a consensus system. The clock can be advanced
/// virtually, which keeps deadline tests deterministic.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
    clock_skew_ms: AtomicU64,
}

#[derive(Default)]
struct Inner {
    contracts: HashMap<ContractId, Contract>,
    payouts: Vec<Payout>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift the chain clock forward. Test aid.
    pub fn advance(&self, ms: u64) {
        self.clock_skew_ms.fetch_add(ms, Ordering::Relaxed);
    }

    /// Every settlement this ledger has performed, in order.
    pub fn payouts(&self) -> Vec<Payout> {
        self.inner.lock().unwrap().payouts.clone()
    }

    fn with_contract<T>(
        &self,
        id: &ContractId,
        f: impl FnOnce(&mut Contract, u64) -> Result<T, LedgerError>,
    ) -> LedgerResult<T> {
        let now = self.now_ms();
        let mut inner = self.inner.lock().unwrap();
        let contract = inner.contracts.get_mut(id).ok_or(LedgerError::NotFound)?;
        f(contract, now)
    }

    fn record_payout(&self, payout: Payout) {
        self.inner.lock().unwrap().payouts.push(payout);
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn deploy(
        &self,
        caller: Address,
        params: ContractParams,
        payment: u64,
    ) -> LedgerResult<ContractId> {
        let now = self.now_ms();
        let contract = Contract::deploy(params, caller, payment, now)?;

        let mut id = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut id);

        self.inner.lock().unwrap().contracts.insert(id, contract);
        Ok(id)
    }

    async fn snapshot(&self, id: &ContractId) -> LedgerResult<ContractSnapshot> {
        let inner = self.inner.lock().unwrap();
        let contract = inner.contracts.get(id).ok_or(LedgerError::NotFound)?;
        Ok(contract.snapshot())
    }

    async fn reveal(
        &self,
        id: &ContractId,
        caller: Address,
        key: [u8; 32],
        collateral: u64,
    ) -> LedgerResult<()> {
        self.with_contract(id, |contract, now| {
            contract.reveal(caller, key, collateral, now).map_err(Into::into)
        })
    }

    async fn cancel(&self, id: &ContractId, caller: Address) -> LedgerResult<()> {
        let payout = self.with_contract(id, |contract, now| {
            contract.cancel(caller, now).map_err(Into::into)
        })?;
        self.record_payout(payout);
        Ok(())
    }

    async fn refund(
        &self,
        id: &ContractId,
        caller: Address,
        claim: FraudClaim,
    ) -> LedgerResult<()> {
        let payout = self.with_contract(id, |contract, now| {
            contract.refund(caller, &claim, now).map_err(Into::into)
        })?;
        self.record_payout(payout);
        Ok(())
    }

    async fn claim(&self, id: &ContractId, caller: Address) -> LedgerResult<()> {
        let payout = self.with_contract(id, |contract, now| {
            contract.claim(caller, now).map_err(Into::into)
        })?;
        self.record_payout(payout);
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before the epoch")
            .as_millis() as u64;
        wall + self.clock_skew_ms.load(Ordering::Relaxed)
    }
}
