//! Record store trait definition.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::record::TransferRecord;

/// Persistent storage for transfer records, keyed by transfer id.
///
/// Implementations must make `put` durable before returning: a record that
/// was revealed against must survive a process crash so the claim can be
/// replayed at startup.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or overwrite the record for its transfer id.
    async fn put(&self, record: &TransferRecord) -> StoreResult<()>;

    /// Fetch a record. Returns `StoreError::NotFound` if absent.
    async fn get(&self, transfer_id: &[u8; 32]) -> StoreResult<TransferRecord>;

    /// Remove a record. Idempotent: deleting an absent record succeeds.
    async fn delete(&self, transfer_id: &[u8; 32]) -> StoreResult<()>;

    /// All stored records, in no particular order.
    async fn list(&self) -> StoreResult<Vec<TransferRecord>>;
}
