use std::path::Path;
use std::sync::Arc;

use tredd_contract::{Address, Ledger, MemoryLedger};
use tredd_store::{ContentDir, MemoryRecordStore, RecordStore, SledRecordStore};

use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::identity;
use crate::queue::ClaimQueue;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub ledger: Arc<dyn Ledger>,
    pub content: ContentDir,
    pub seller: Address,
    pub queue: ClaimQueue,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn RecordStore> = match config.store.backend.as_str() {
            "sled" => Arc::new(SledRecordStore::open(&config.store.path)?),
            "memory" => Arc::new(MemoryRecordStore::new()),
            other => anyhow::bail!("unknown store backend '{other}'. Valid options: 'sled', 'memory'"),
        };

        let ledger: Arc<dyn Ledger> = match config.ledger.backend.as_str() {
            "memory" => Arc::new(MemoryLedger::new()),
            other => anyhow::bail!("unknown ledger backend '{other}'. Valid options: 'memory'"),
        };

        let seller = identity::load_or_generate(Path::new(&config.seller_key_path))?;
        tracing::info!(seller = %seller, "seller identity loaded");

        Ok(Self {
            store,
            ledger,
            content: ContentDir::new(&config.content_dir),
            seller,
            queue: ClaimQueue::new(),
            config: Arc::new(config.clone()),
        })
    }

    /// Accept or reject a proposed payment for the requested content.
    ///
    /// Per-content pricing is a non-goal; any positive amount in any asset
    /// clears.
    pub fn check_price(
        &self,
        amount: u64,
        _asset_id: &[u8; 32],
        _clear_root: &[u8; 32],
    ) -> ServerResult<()> {
        if amount == 0 {
            return Err(ServerError::PolicyRejected(
                "amount must be 1 or higher".into(),
            ));
        }
        Ok(())
    }

    /// Spawn the claim worker for this state.
    pub fn spawn_claim_worker(&self) -> tokio::task::JoinHandle<()> {
        let queue = self.queue.clone();
        let store = self.store.clone();
        let ledger = self.ledger.clone();
        let seller = self.seller;
        tokio::spawn(async move { queue.run(store, ledger, seller).await })
    }
}
