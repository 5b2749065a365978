use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod health;
mod ledger;
mod request;
mod reveal;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/request", post(request::request_delivery))
        .route("/reveal", post(reveal::reveal_key))
        .route("/health", get(health::health_check))
        .route("/ledger/deploy", post(ledger::deploy))
        .route("/ledger/contracts/{id}", get(ledger::contract))
        .route("/ledger/contracts/{id}/cancel", post(ledger::cancel))
        .route("/ledger/contracts/{id}/refund", post(ledger::refund))
        .route("/ledger/contracts/{id}/claim", post(ledger::claim))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Decode a 64-character hex field, naming it in the error.
fn parse_hash(value: &str, what: &str) -> Result<[u8; 32], crate::error::ServerError> {
    tredd_core::hash_from_hex(value)
        .ok_or_else(|| crate::error::ServerError::InvalidRequest(format!("malformed {what}")))
}
