use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tredd_contract::LedgerError;
use tredd_core::CodecError;
use tredd_store::StoreError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("proposed payment rejected: {0}")]
    PolicyRejected(String),

    #[error("content not found")]
    ContentNotFound,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("ledger failure: {0}")]
    Ledger(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::PolicyRejected(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::ContentNotFound => (StatusCode::NOT_FOUND, "content not found".into()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ServerError::Ledger(msg) => {
                tracing::error!("ledger failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "ledger failure".into())
            }
            ServerError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".into(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound => ServerError::NotFound("contract not found".into()),
            LedgerError::Contract(e) => ServerError::Conflict(e.to_string()),
            LedgerError::Unavailable(msg) => ServerError::Ledger(msg),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServerError::NotFound(format!("transfer {id} not found")),
            StoreError::ContentNotFound(_) => ServerError::ContentNotFound,
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<CodecError> for ServerError {
    fn from(err: CodecError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
