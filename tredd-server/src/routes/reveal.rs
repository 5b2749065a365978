use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;
use tracing::{info, warn};
use tredd_contract::{ContractStatus, LedgerError};

use super::parse_hash;
use crate::error::{ServerError, ServerResult};
use crate::routes::request::TRANSFER_ID_HEADER;
use crate::state::AppState;

/// Bounded retries for the reveal submission; past the deadline the
/// transfer is lost anyway.
const REVEAL_ATTEMPTS: u32 = 3;
const REVEAL_RETRY_BASE: Duration = Duration::from_millis(500);

#[derive(Deserialize)]
pub struct RevealRequest {
    pub contract_id: String,
}

/// POST /reveal
///
/// The buyer hands over the contract it deployed for a transfer. The seller
/// checks the on-chain parameters against its record, reveals the key with
/// collateral, and schedules the claim for when the refund window shuts.
pub async fn reveal_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RevealRequest>,
) -> ServerResult<StatusCode> {
    let transfer_id = headers
        .get(TRANSFER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::InvalidRequest("missing transfer ID header".into()))
        .and_then(|v| parse_hash(v, "transfer ID"))?;
    let contract_id = parse_hash(&req.contract_id, "contract ID")?;

    let mut record = state.store.get(&transfer_id).await?;

    let snapshot = state.ledger.snapshot(&contract_id).await.map_err(|e| match e {
        LedgerError::NotFound => ServerError::InvalidRequest("unknown contract".into()),
        other => other.into(),
    })?;

    // Only reveal against a contract that commits to exactly this transfer.
    let p = &snapshot.params;
    if p.clear_root != record.clear_root
        || p.cipher_root != record.cipher_root
        || p.amount != record.amount
        || p.asset_id != record.asset_id
        || p.seller != state.seller
        || p.reveal_deadline_ms != record.reveal_deadline_ms
        || p.refund_deadline_ms != record.refund_deadline_ms
    {
        return Err(ServerError::InvalidRequest(
            "contract parameters do not match the transfer".into(),
        ));
    }
    if snapshot.status != ContractStatus::Funded {
        return Err(ServerError::Conflict(format!(
            "contract is {}, expected funded",
            snapshot.status.as_str()
        )));
    }

    // Persist the binding before touching the chain, so a crash replays the
    // claim instead of forgetting the transfer.
    record.buyer = Some(p.buyer);
    record.contract_id = Some(contract_id);
    state.store.put(&record).await?;

    let collateral = p.collateral;
    let mut attempt = 0;
    loop {
        match state
            .ledger
            .reveal(&contract_id, state.seller, record.key, collateral)
            .await
        {
            Ok(()) => break,
            Err(LedgerError::Unavailable(e)) if attempt + 1 < REVEAL_ATTEMPTS => {
                attempt += 1;
                warn!(
                    transfer = %hex::encode(transfer_id),
                    attempt,
                    "reveal submission failed, retrying: {e}"
                );
                tokio::time::sleep(REVEAL_RETRY_BASE * 2u32.pow(attempt)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    state.queue.schedule(
        record.refund_deadline_ms + state.config.limits.claim_grace_ms,
        transfer_id,
    );

    info!(
        transfer = %hex::encode(transfer_id),
        contract = %req.contract_id,
        "revealing key"
    );
    Ok(StatusCode::NO_CONTENT)
}
