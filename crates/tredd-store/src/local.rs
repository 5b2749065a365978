//! Sled-backed record store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::record::TransferRecord;
use crate::traits::RecordStore;

/// Durable record store over an embedded sled database.
///
/// All mutations are serialized behind one coarse async lock and flushed
/// before returning, so a record that was revealed against is on disk
/// before the reveal transaction leaves the process.
pub struct SledRecordStore {
    tree: sled::Tree,
    write_lock: Mutex<()>,
}

impl SledRecordStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        let db = sled::open(path).map_err(|e| StoreError::Backend(format!("sled: {e}")))?;
        let tree = db
            .open_tree("records")
            .map_err(|e| StoreError::Backend(format!("sled: {e}")))?;
        Ok(Self {
            tree,
            write_lock: Mutex::new(()),
        })
    }

    async fn flush(&self) -> StoreResult<()> {
        self.tree
            .flush_async()
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(format!("sled flush: {e}")))
    }
}

#[async_trait]
impl RecordStore for SledRecordStore {
    async fn put(&self, record: &TransferRecord) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.tree
            .insert(record.transfer_id, record.to_bytes())
            .map_err(|e| StoreError::Backend(format!("sled: {e}")))?;
        self.flush().await
    }

    async fn get(&self, transfer_id: &[u8; 32]) -> StoreResult<TransferRecord> {
        let bytes = self
            .tree
            .get(transfer_id)
            .map_err(|e| StoreError::Backend(format!("sled: {e}")))?
            .ok_or_else(|| StoreError::NotFound(hex::encode(transfer_id)))?;
        TransferRecord::from_bytes(&bytes)
    }

    async fn delete(&self, transfer_id: &[u8; 32]) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.tree
            .remove(transfer_id)
            .map_err(|e| StoreError::Backend(format!("sled: {e}")))?;
        self.flush().await
    }

    async fn list(&self) -> StoreResult<Vec<TransferRecord>> {
        let mut records = Vec::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry.map_err(|e| StoreError::Backend(format!("sled: {e}")))?;
            records.push(TransferRecord::from_bytes(&bytes)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tredd_contract::Address;

    fn record(id: u8) -> TransferRecord {
        TransferRecord {
            transfer_id: [id; 32],
            amount: 77,
            asset_id: [0; 32],
            clear_root: [1; 32],
            cipher_root: [2; 32],
            key: [3; 32],
            seller: Address([4; 32]),
            buyer: Some(Address([5; 32])),
            contract_id: Some([6; 32]),
            reveal_deadline_ms: 100,
            refund_deadline_ms: 200,
        }
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record(1);

        {
            let store = SledRecordStore::open(dir.path()).unwrap();
            store.put(&rec).await.unwrap();
        }

        let store = SledRecordStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&rec.transfer_id).await.unwrap(), rec);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledRecordStore::open(dir.path()).unwrap();
        let rec = record(2);

        store.put(&rec).await.unwrap();
        store.delete(&rec.transfer_id).await.unwrap();
        store.delete(&rec.transfer_id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
