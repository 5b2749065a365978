//! In-memory record store (for testing)

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::record::TransferRecord;
use crate::traits::RecordStore;

/// Volatile record store for unit tests. Data is lost on drop.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<[u8; 32], TransferRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: &TransferRecord) -> StoreResult<()> {
        self.records
            .write()
            .unwrap()
            .insert(record.transfer_id, record.clone());
        Ok(())
    }

    async fn get(&self, transfer_id: &[u8; 32]) -> StoreResult<TransferRecord> {
        self.records
            .read()
            .unwrap()
            .get(transfer_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hex::encode(transfer_id)))
    }

    async fn delete(&self, transfer_id: &[u8; 32]) -> StoreResult<()> {
        self.records.write().unwrap().remove(transfer_id);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<TransferRecord>> {
        Ok(self.records.read().unwrap().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tredd_contract::Address;

    fn record(id: u8) -> TransferRecord {
        TransferRecord {
            transfer_id: [id; 32],
            amount: 10,
            asset_id: [0; 32],
            clear_root: [1; 32],
            cipher_root: [2; 32],
            key: [3; 32],
            seller: Address([4; 32]),
            buyer: None,
            contract_id: None,
            reveal_deadline_ms: 100,
            refund_deadline_ms: 200,
        }
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryRecordStore::new();
        let rec = record(1);

        store.put(&rec).await.unwrap();
        assert_eq!(store.get(&rec.transfer_id).await.unwrap(), rec);

        store.delete(&rec.transfer_id).await.unwrap();
        assert!(matches!(
            store.get(&rec.transfer_id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));

        // Idempotent delete.
        store.delete(&rec.transfer_id).await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_everything() {
        let store = MemoryRecordStore::new();
        store.put(&record(1)).await.unwrap();
        store.put(&record(2)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
