//! Contract and ledger error types.

use thiserror::Error;

use crate::contract::ContractStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("call not allowed in state {actual:?}")]
    WrongState { actual: ContractStatus },

    #[error("caller is not authorized for this call")]
    Unauthorized,

    #[error("deadline has passed")]
    DeadlineExpired,

    #[error("deadline has not been reached")]
    DeadlineNotReached,

    #[error("reveal deadline must precede the refund deadline and lie in the future")]
    InvalidDeadlines,

    #[error("payment {payment} does not match the contract amount {amount}")]
    PaymentMismatch { payment: u64, amount: u64 },

    #[error("collateral {collateral} is less than the contract amount {amount}")]
    InsufficientCollateral { collateral: u64, amount: u64 },

    #[error("fraud claim does not prove tampering")]
    FraudNotProven,

    #[error("malformed fraud proof: {0}")]
    Proof(#[from] tredd_core::ProofError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("contract not found")]
    NotFound,

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
