use std::io::{BufReader, BufWriter, Write};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use rand::RngCore;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tokio_util::io::ReaderStream;
use tracing::info;
use tredd_core::{encode, CodecError, Commitment};
use tredd_store::TransferRecord;

use super::parse_hash;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub const TRANSFER_ID_HEADER: &str = "x-tredd-transfer-id";
pub const CIPHER_ROOT_HEADER: &str = "x-tredd-cipher-root";

#[derive(Deserialize)]
pub struct DeliveryRequest {
    pub clear_root: String,
    pub amount: u64,
    pub asset_id: String,
    pub reveal_deadline_ms: u64,
    pub refund_deadline_ms: u64,
}

/// POST /request
///
/// Validates the proposal, encrypts the requested content under a fresh
/// key into a scratch file, persists the transfer record, and streams the
/// `(clear hash, cipher chunk)` records back. The scratch file exists
/// because the cipher root is only known at stream end but must be recorded
/// before the first byte reaches the buyer; it is unlinked on every exit
/// path.
pub async fn request_delivery(
    State(state): State<AppState>,
    Json(req): Json<DeliveryRequest>,
) -> ServerResult<Response> {
    let clear_root = parse_hash(&req.clear_root, "clear root")?;
    let asset_id = parse_hash(&req.asset_id, "asset ID")?;

    if req.amount == 0 {
        return Err(ServerError::InvalidRequest("non-positive amount".into()));
    }
    state.check_price(req.amount, &asset_id, &clear_root)?;

    let limits = &state.config.limits;
    let now = state.ledger.now_ms();
    if req.reveal_deadline_ms < now + limits.min_reveal_lead_ms {
        return Err(ServerError::InvalidRequest(format!(
            "reveal deadline too soon, require at least {}ms of lead",
            limits.min_reveal_lead_ms
        )));
    }
    if req.refund_deadline_ms <= req.reveal_deadline_ms {
        return Err(ServerError::InvalidRequest(
            "refund deadline must follow the reveal deadline".into(),
        ));
    }
    if req.refund_deadline_ms - req.reveal_deadline_ms > limits.max_refund_window_ms {
        return Err(ServerError::InvalidRequest(format!(
            "refund window too long, require at most {}ms",
            limits.max_refund_window_ms
        )));
    }

    let content_file = state.content.open(&clear_root)?;
    let content_type = state.content.content_type(&clear_root).await;

    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    let mut transfer_id = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut transfer_id);

    let (commitment, scratch) = tokio::task::spawn_blocking(
        move || -> Result<(Commitment, NamedTempFile), CodecError> {
            let scratch = NamedTempFile::new()?;
            let mut reader = BufReader::new(content_file);
            let mut writer = BufWriter::new(scratch.as_file());
            let commitment = encode(&mut writer, &mut reader, &key)?;
            writer.flush()?;
            drop(writer);
            Ok((commitment, scratch))
        },
    )
    .await
    .map_err(|e| ServerError::Internal(format!("encode task: {e}")))??;

    if commitment.clear_root != clear_root {
        return Err(ServerError::Internal(
            "content tree entry does not match its clear root".into(),
        ));
    }

    let record = TransferRecord {
        transfer_id,
        amount: req.amount,
        asset_id,
        clear_root,
        cipher_root: commitment.cipher_root,
        key,
        seller: state.seller,
        buyer: None,
        contract_id: None,
        reveal_deadline_ms: req.reveal_deadline_ms,
        refund_deadline_ms: req.refund_deadline_ms,
    };
    state.store.put(&record).await?;

    info!(
        transfer = %hex::encode(transfer_id),
        clear_root = %req.clear_root,
        amount = req.amount,
        asset = %req.asset_id,
        "new transfer"
    );

    // Stream from a reopened handle; dropping the scratch guard unlinks the
    // path while the handle keeps the bytes alive.
    let stream_file = scratch
        .reopen()
        .map_err(|e| ServerError::Internal(format!("reopening scratch file: {e}")))?;
    let length = stream_file
        .metadata()
        .map_err(|e| ServerError::Internal(format!("scratch metadata: {e}")))?
        .len();
    drop(scratch);

    let body = Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(stream_file)));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, length)
        .header(TRANSFER_ID_HEADER, hex::encode(transfer_id))
        .header(CIPHER_ROOT_HEADER, hex::encode(commitment.cipher_root))
        .body(body)
        .map_err(|e| ServerError::Internal(e.to_string()))
}
