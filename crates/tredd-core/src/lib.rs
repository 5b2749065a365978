//! # tredd-core: verifiable chunked delivery
//!
//! This crate implements the content side of the Tredd fair-exchange
//! protocol: a streaming encrypt-and-commit codec, Merkle commitments over
//! both cleartext and ciphertext, and the fraud-proof check a contract runs
//! to adjudicate a tampered delivery.
//!
//! The seller encodes a file into a stream of `(clear hash, cipher chunk)`
//! records and commits to two Merkle roots. The buyer rebuilds both roots
//! from the delivered stream, decrypts once the key is revealed, and for any
//! chunk whose delivered clear hash disagrees with its decryption obtains a
//! [`FraudWitness`] from which Merkle proofs can be built.
//!
//! ## Example: honest round trip
//!
//! ```rust
//! use std::io::Cursor;
//! use tredd_core::{decode, encode, Delivery};
//!
//! # fn main() -> Result<(), tredd_core::CodecError> {
//! let key = [7u8; 32];
//! let content = b"pay per chunk";
//!
//! let mut stream = Vec::new();
//! let commitment = encode(&mut stream, &mut Cursor::new(&content[..]), &key)?;
//!
//! let mut plaintext = Vec::new();
//! let decoded = decode(
//!     &mut plaintext,
//!     &mut Cursor::new(&stream),
//!     &key,
//!     &commitment.clear_root,
//!     &commitment.cipher_root,
//! )?;
//! assert_eq!(plaintext, content);
//! assert!(matches!(decoded.delivery(), Delivery::Good));
//! # Ok(())
//! # }
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod fraud;
pub mod keystream;
pub mod merkle;
pub mod varint;

pub use decode::{decode, receive, Decoded, Delivery, FraudWitness, Received};
pub use encode::{clear_merkle_root, encode, Commitment};
pub use error::{CodecError, CodecResult, ProofError, ProofResult};
pub use fraud::verify_fraud;
pub use keystream::apply_keystream;
pub use merkle::{leaf_hash, MerkleProof, MerkleTree, ProofStep};

/// Cleartext span covered by one record. The last chunk of a file may be
/// shorter; every other chunk is exactly this long.
pub const CHUNK_SIZE: usize = 8192;

/// Encode a 32-byte hash as lowercase hex.
pub fn hash_to_hex(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}

/// Decode lowercase or uppercase hex into a 32-byte hash.
pub fn hash_from_hex(s: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}
