//! Deadline-keyed claim queue.
//!
//! Entries are (due time, transfer id) pairs ordered by due time. A single
//! cooperative worker sleeps until the earliest entry is due, submits the
//! claim, and removes it. Claims are idempotent against the contract's
//! state guard, so firing twice (or after a crash replay) is harmless.
//! Failed submissions are re-enqueued with exponential backoff and jitter.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::Notify;
use tracing::{info, warn};
use tredd_contract::{Address, ContractError, Ledger, LedgerError};
use tredd_store::{RecordStore, StoreError};

const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_MAX_MS: u64 = 60_000;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due_ms: u64,
    transfer_id: [u8; 32],
    attempt: u32,
}

#[derive(Clone, Default)]
pub struct ClaimQueue {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<BinaryHeap<Reverse<Entry>>>,
    notify: Notify,
}

impl ClaimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a claim for `transfer_id` at `due_ms`.
    pub fn schedule(&self, due_ms: u64, transfer_id: [u8; 32]) {
        self.push(Entry {
            due_ms,
            transfer_id,
            attempt: 0,
        });
    }

    /// Re-enqueue every persisted record's claim. Called at startup so
    /// claims survive a crash between reveal and settlement.
    pub async fn replay(&self, store: &dyn RecordStore, grace_ms: u64) -> anyhow::Result<usize> {
        let records = store.list().await?;
        for record in &records {
            info!(
                transfer = %hex::encode(record.transfer_id),
                "queueing claim for persisted transfer"
            );
            self.schedule(record.refund_deadline_ms + grace_ms, record.transfer_id);
        }
        Ok(records.len())
    }

    fn push(&self, entry: Entry) {
        self.inner.entries.lock().unwrap().push(Reverse(entry));
        self.inner.notify.notify_one();
    }

    fn peek_due(&self) -> Option<u64> {
        self.inner
            .entries
            .lock()
            .unwrap()
            .peek()
            .map(|Reverse(e)| e.due_ms)
    }

    fn pop(&self) -> Option<Entry> {
        self.inner.entries.lock().unwrap().pop().map(|Reverse(e)| e)
    }

    /// The worker loop. Runs until the task is dropped.
    pub async fn run(self, store: Arc<dyn RecordStore>, ledger: Arc<dyn Ledger>, seller: Address) {
        loop {
            match self.peek_due() {
                None => self.inner.notify.notified().await,
                Some(due_ms) => {
                    let now = ledger.now_ms();
                    if due_ms > now {
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_millis(due_ms - now)) => {}
                            _ = self.inner.notify.notified() => {}
                        }
                        continue;
                    }
                    if let Some(entry) = self.pop() {
                        self.settle(entry, store.as_ref(), ledger.as_ref(), seller)
                            .await;
                    }
                }
            }
        }
    }

    async fn settle(&self, entry: Entry, store: &dyn RecordStore, ledger: &dyn Ledger, seller: Address) {
        let transfer = hex::encode(entry.transfer_id);

        let record = match store.get(&entry.transfer_id).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => return, // already settled
            Err(e) => {
                warn!(%transfer, "reading transfer record failed: {e}");
                self.retry(entry, ledger.now_ms());
                return;
            }
        };

        let Some(contract_id) = record.contract_id else {
            // Served but never paid for; past the refund deadline the
            // transfer is dead either way.
            info!(%transfer, "transfer expired unrevealed, dropping record");
            self.drop_record(store, &entry.transfer_id, &transfer).await;
            return;
        };

        match ledger.claim(&contract_id, seller).await {
            Ok(()) => {
                info!(%transfer, "payment claimed");
                self.drop_record(store, &entry.transfer_id, &transfer).await;
            }
            Err(LedgerError::Contract(ContractError::DeadlineNotReached)) => {
                // Fired early relative to the chain clock; try again soon.
                self.retry(entry, ledger.now_ms());
            }
            Err(LedgerError::Contract(_)) | Err(LedgerError::NotFound) => {
                // The state guard made this a no-op: refunded, cancelled,
                // or already claimed.
                info!(%transfer, "claim is a no-op, contract already settled");
                self.drop_record(store, &entry.transfer_id, &transfer).await;
            }
            Err(LedgerError::Unavailable(e)) => {
                warn!(%transfer, attempt = entry.attempt, "claim submission failed: {e}");
                self.retry(entry, ledger.now_ms());
            }
        }
    }

    async fn drop_record(&self, store: &dyn RecordStore, transfer_id: &[u8; 32], transfer: &str) {
        if let Err(e) = store.delete(transfer_id).await {
            warn!(%transfer, "could not delete transfer record: {e}");
        }
    }

    fn retry(&self, entry: Entry, now_ms: u64) {
        let attempt = entry.attempt + 1;
        self.push(Entry {
            due_ms: now_ms + backoff_ms(attempt),
            transfer_id: entry.transfer_id,
            attempt,
        });
    }
}

/// Exponential backoff capped at one minute, with half-range jitter.
fn backoff_ms(attempt: u32) -> u64 {
    let cap = BACKOFF_BASE_MS
        .saturating_mul(1u64 << attempt.min(6))
        .min(BACKOFF_MAX_MS);
    cap / 2 + rand::thread_rng().gen_range(0..=cap / 2)
}
