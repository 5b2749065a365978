//! Development-chain routes.
//!
//! The daemon hosts its in-process ledger over HTTP so a buyer can deploy,
//! watch, and settle contracts against the same chain the seller uses,
//! the same shape as running against a hosted chain endpoint. Callers are
//! identified by the address they state; a production ledger would demand
//! signatures.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tredd_contract::{Address, ContractParams, FraudClaim};

use super::parse_hash;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

fn parse_address(value: &str, what: &str) -> ServerResult<Address> {
    Address::from_hex(value)
        .ok_or_else(|| ServerError::InvalidRequest(format!("malformed {what}")))
}

#[derive(Deserialize)]
pub struct DeployRequest {
    pub buyer: String,
    pub seller: String,
    pub amount: u64,
    pub collateral: u64,
    pub asset_id: String,
    pub clear_root: String,
    pub cipher_root: String,
    pub reveal_deadline_ms: u64,
    pub refund_deadline_ms: u64,
    pub payment: u64,
}

#[derive(Serialize)]
pub struct DeployResponse {
    pub contract_id: String,
}

/// POST /ledger/deploy
pub async fn deploy(
    State(state): State<AppState>,
    Json(req): Json<DeployRequest>,
) -> ServerResult<(StatusCode, Json<DeployResponse>)> {
    let buyer = parse_address(&req.buyer, "buyer address")?;
    let params = ContractParams {
        buyer,
        seller: parse_address(&req.seller, "seller address")?,
        amount: req.amount,
        collateral: req.collateral,
        asset_id: parse_hash(&req.asset_id, "asset ID")?,
        clear_root: parse_hash(&req.clear_root, "clear root")?,
        cipher_root: parse_hash(&req.cipher_root, "cipher root")?,
        reveal_deadline_ms: req.reveal_deadline_ms,
        refund_deadline_ms: req.refund_deadline_ms,
    };

    let contract_id = state.ledger.deploy(buyer, params, req.payment).await?;
    Ok((
        StatusCode::CREATED,
        Json(DeployResponse {
            contract_id: hex::encode(contract_id),
        }),
    ))
}

#[derive(Serialize)]
pub struct ContractView {
    pub status: String,
    /// Hex key, present once revealed.
    pub key: Option<String>,
    pub buyer: String,
    pub seller: String,
    pub amount: u64,
    pub collateral: u64,
    pub asset_id: String,
    pub clear_root: String,
    pub cipher_root: String,
    pub reveal_deadline_ms: u64,
    pub refund_deadline_ms: u64,
    /// The chain clock at query time; deadline decisions key off this.
    pub now_ms: u64,
}

/// GET /ledger/contracts/{id}
pub async fn contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<ContractView>> {
    let contract_id = parse_hash(&id, "contract ID")?;
    let snapshot = state.ledger.snapshot(&contract_id).await?;
    let p = snapshot.params;

    Ok(Json(ContractView {
        status: snapshot.status.as_str().to_string(),
        key: snapshot.key.map(hex::encode),
        buyer: p.buyer.to_hex(),
        seller: p.seller.to_hex(),
        amount: p.amount,
        collateral: p.collateral,
        asset_id: hex::encode(p.asset_id),
        clear_root: hex::encode(p.clear_root),
        cipher_root: hex::encode(p.cipher_root),
        reveal_deadline_ms: p.reveal_deadline_ms,
        refund_deadline_ms: p.refund_deadline_ms,
        now_ms: state.ledger.now_ms(),
    }))
}

#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

/// POST /ledger/contracts/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CallerRequest>,
) -> ServerResult<StatusCode> {
    let contract_id = parse_hash(&id, "contract ID")?;
    let caller = parse_address(&req.caller, "caller address")?;
    state.ledger.cancel(&contract_id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct RefundRequest {
    pub caller: String,
    pub index: u64,
    /// Hex-encoded cipher chunk.
    pub cipher_chunk: String,
    pub clear_hash: String,
    /// Flat proof encodings: 32-byte sibling plus direction flag per entry.
    pub cipher_proof: String,
    pub clear_proof: String,
}

/// POST /ledger/contracts/{id}/refund
pub async fn refund(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> ServerResult<StatusCode> {
    let contract_id = parse_hash(&id, "contract ID")?;
    let caller = parse_address(&req.caller, "caller address")?;

    let claim = FraudClaim {
        index: req.index,
        cipher_chunk: hex::decode(&req.cipher_chunk)
            .map_err(|_| ServerError::InvalidRequest("malformed cipher chunk".into()))?,
        clear_hash: parse_hash(&req.clear_hash, "clear hash")?,
        cipher_proof: hex::decode(&req.cipher_proof)
            .map_err(|_| ServerError::InvalidRequest("malformed cipher proof".into()))?,
        clear_proof: hex::decode(&req.clear_proof)
            .map_err(|_| ServerError::InvalidRequest("malformed clear proof".into()))?,
    };

    state.ledger.refund(&contract_id, caller, claim).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /ledger/contracts/{id}/claim
pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CallerRequest>,
) -> ServerResult<StatusCode> {
    let contract_id = parse_hash(&id, "contract ID")?;
    let caller = parse_address(&req.caller, "caller address")?;
    state.ledger.claim(&contract_id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
