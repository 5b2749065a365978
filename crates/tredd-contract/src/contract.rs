//! The on-chain escrow for one transfer.

use std::fmt;
use std::str::FromStr;

use tredd_core::{verify_fraud, MerkleProof};

use crate::error::ContractError;

/// A 32-byte ledger account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub fn from_hex(s: &str) -> Option<Self> {
        tredd_core::hash_from_hex(s).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..8])
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or("expected 64 hex characters")
    }
}

/// Immutable parameters fixed at deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractParams {
    pub buyer: Address,
    pub seller: Address,
    pub amount: u64,
    pub collateral: u64,
    pub asset_id: [u8; 32],
    pub clear_root: [u8; 32],
    pub cipher_root: [u8; 32],
    pub reveal_deadline_ms: u64,
    pub refund_deadline_ms: u64,
}

/// Where a contract is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractStatus {
    /// Payment held, waiting for the seller's key.
    Funded,
    /// Key published, collateral held, refund window open.
    Revealed,
    /// Funds went to the buyer. Terminal.
    Refunded,
    /// Funds went to the seller. Terminal.
    Claimed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Funded => "funded",
            Self::Revealed => "revealed",
            Self::Refunded => "refunded",
            Self::Claimed => "claimed",
        }
    }
}

/// A settlement of the full held balance to one party.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub to: Address,
    pub amount: u64,
    pub asset_id: [u8; 32],
}

/// The refund call payload: one chunk, the clear hash the seller delivered
/// for it, and inclusion proofs for both under the committed roots. Proofs
/// use the flat 33-byte-entry wire encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FraudClaim {
    pub index: u64,
    pub cipher_chunk: Vec<u8>,
    pub clear_hash: [u8; 32],
    pub cipher_proof: Vec<u8>,
    pub clear_proof: Vec<u8>,
}

/// Read-only view of a contract, as a chain query would return it.
#[derive(Clone, Copy, Debug)]
pub struct ContractSnapshot {
    pub params: ContractParams,
    pub status: ContractStatus,
    /// Present once the seller has revealed; public from then on.
    pub key: Option<[u8; 32]>,
}

/// One escrowed transfer.
///
/// Guarded transitions either succeed atomically or return an error with no
/// state change; terminal states reject everything.
#[derive(Clone, Debug)]
pub struct Contract {
    params: ContractParams,
    status: ContractStatus,
    key: Option<[u8; 32]>,
    held: u64,
}

impl Contract {
    /// Deploy with the buyer's payment. Requires `payment` to equal the
    /// amount, the reveal deadline to be in the future, and the deadlines to
    /// be ordered.
    pub fn deploy(
        params: ContractParams,
        caller: Address,
        payment: u64,
        now_ms: u64,
    ) -> Result<Self, ContractError> {
        if caller != params.buyer {
            return Err(ContractError::Unauthorized);
        }
        if payment != params.amount {
            return Err(ContractError::PaymentMismatch {
                payment,
                amount: params.amount,
            });
        }
        if params.reveal_deadline_ms >= params.refund_deadline_ms
            || params.reveal_deadline_ms <= now_ms
        {
            return Err(ContractError::InvalidDeadlines);
        }

        Ok(Self {
            params,
            status: ContractStatus::Funded,
            key: None,
            held: payment,
        })
    }

    pub fn params(&self) -> &ContractParams {
        &self.params
    }

    pub fn status(&self) -> ContractStatus {
        self.status
    }

    pub fn key(&self) -> Option<[u8; 32]> {
        self.key
    }

    /// Total funds currently escrowed.
    pub fn held(&self) -> u64 {
        self.held
    }

    pub fn snapshot(&self) -> ContractSnapshot {
        ContractSnapshot {
            params: self.params,
            status: self.status,
            key: self.key,
        }
    }

    fn require_status(&self, expected: ContractStatus) -> Result<(), ContractError> {
        if self.status != expected {
            return Err(ContractError::WrongState {
                actual: self.status,
            });
        }
        Ok(())
    }

    /// Seller publishes the key, depositing collateral atomically.
    pub fn reveal(
        &mut self,
        caller: Address,
        key: [u8; 32],
        collateral: u64,
        now_ms: u64,
    ) -> Result<(), ContractError> {
        self.require_status(ContractStatus::Funded)?;
        if caller != self.params.seller {
            return Err(ContractError::Unauthorized);
        }
        if now_ms > self.params.reveal_deadline_ms {
            return Err(ContractError::DeadlineExpired);
        }
        if collateral < self.params.amount {
            return Err(ContractError::InsufficientCollateral {
                collateral,
                amount: self.params.amount,
            });
        }

        self.key = Some(key);
        self.held += collateral;
        self.status = ContractStatus::Revealed;
        Ok(())
    }

    /// Buyer reclaims the payment after the seller failed to reveal in time.
    pub fn cancel(&mut self, caller: Address, now_ms: u64) -> Result<Payout, ContractError> {
        self.require_status(ContractStatus::Funded)?;
        if caller != self.params.buyer {
            return Err(ContractError::Unauthorized);
        }
        if now_ms <= self.params.reveal_deadline_ms {
            return Err(ContractError::DeadlineNotReached);
        }

        self.status = ContractStatus::Refunded;
        Ok(self.settle(self.params.buyer))
    }

    /// Buyer proves tampering and takes payment plus collateral.
    pub fn refund(
        &mut self,
        caller: Address,
        claim: &FraudClaim,
        now_ms: u64,
    ) -> Result<Payout, ContractError> {
        self.require_status(ContractStatus::Revealed)?;
        if caller != self.params.buyer {
            return Err(ContractError::Unauthorized);
        }
        if now_ms > self.params.refund_deadline_ms {
            return Err(ContractError::DeadlineExpired);
        }

        let cipher_proof = MerkleProof::from_bytes(&claim.cipher_proof)?;
        let clear_proof = MerkleProof::from_bytes(&claim.clear_proof)?;
        let key = self.key.expect("revealed contract always has a key");

        if !verify_fraud(
            claim.index,
            &claim.cipher_chunk,
            &claim.clear_hash,
            &cipher_proof,
            &clear_proof,
            &self.params.cipher_root,
            &self.params.clear_root,
            &key,
        ) {
            return Err(ContractError::FraudNotProven);
        }

        self.status = ContractStatus::Refunded;
        Ok(self.settle(self.params.buyer))
    }

    /// Seller collects payment plus collateral once the refund window shut.
    pub fn claim(&mut self, caller: Address, now_ms: u64) -> Result<Payout, ContractError> {
        self.require_status(ContractStatus::Revealed)?;
        if caller != self.params.seller {
            return Err(ContractError::Unauthorized);
        }
        if now_ms <= self.params.refund_deadline_ms {
            return Err(ContractError::DeadlineNotReached);
        }

        self.status = ContractStatus::Claimed;
        Ok(self.settle(self.params.seller))
    }

    fn settle(&mut self, to: Address) -> Payout {
        let amount = self.held;
        self.held = 0;
        Payout {
            to,
            amount,
            asset_id: self.params.asset_id,
        }
    }
}
