//! Buyer-side stream verification and decryption.

use std::io::{Read, Write};

use crate::encode::read_full;
use crate::error::{CodecError, CodecResult, ProofResult};
use crate::keystream::apply_keystream;
use crate::merkle::{leaf_hash, MerkleProof, MerkleTree};
use crate::{hash_to_hex, CHUNK_SIZE};

/// Commitments recomputed from a delivered stream, before any key is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Received {
    pub clear_root: [u8; 32],
    pub cipher_root: [u8; 32],
    pub chunks: u64,
}

/// Evidence that one delivered chunk does not decrypt to its committed
/// clear hash. Combined with Merkle proofs from the delivered trees this is
/// everything a refund call needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FraudWitness {
    pub index: u64,
    pub cipher_chunk: Vec<u8>,
    /// The clear hash the seller delivered for this index.
    pub clear_hash: [u8; 32],
}

/// Outcome of a full decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Every chunk decrypted to its committed clear hash and the clear root
    /// matched the expected commitment.
    Good,
    /// The delivery disagreed with the clear commitment. Each witness backs
    /// one refund claim.
    Bad { witnesses: Vec<FraudWitness> },
}

/// A verified, decrypted delivery with its Merkle trees retained for proof
/// generation.
#[derive(Debug)]
pub struct Decoded {
    clear_root: [u8; 32],
    cipher_root: [u8; 32],
    delivery: Delivery,
    clear_tree: MerkleTree,
    cipher_tree: MerkleTree,
}

impl Decoded {
    pub fn clear_root(&self) -> [u8; 32] {
        self.clear_root
    }

    pub fn cipher_root(&self) -> [u8; 32] {
        self.cipher_root
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    pub fn is_good(&self) -> bool {
        matches!(self.delivery, Delivery::Good)
    }

    pub fn witnesses(&self) -> &[FraudWitness] {
        match &self.delivery {
            Delivery::Good => &[],
            Delivery::Bad { witnesses } => witnesses,
        }
    }

    /// Inclusion proof for a delivered clear hash, against the clear root.
    pub fn prove_clear(&self, index: u64) -> ProofResult<MerkleProof> {
        self.clear_tree.prove(index)
    }

    /// Inclusion proof for a delivered cipher chunk, against the cipher root.
    pub fn prove_cipher(&self, index: u64) -> ProofResult<MerkleProof> {
        self.cipher_tree.prove(index)
    }
}

/// Read one record from the stream.
///
/// Returns `None` at a clean end of stream, otherwise the chunk length and
/// the delivered clear hash. A short chunk is only legal for the last
/// record; callers check that the stream ends after one.
fn read_record<R: Read>(
    stream: &mut R,
    index: u64,
    chunk: &mut [u8],
) -> CodecResult<Option<(usize, [u8; 32])>> {
    let mut clear_hash = [0u8; 32];
    let n = read_full(stream, &mut clear_hash)?;
    if n == 0 {
        return Ok(None);
    }
    if n < 32 {
        return Err(CodecError::Truncated { index });
    }

    let len = read_full(stream, chunk)?;
    if len == 0 {
        return Err(CodecError::Truncated { index });
    }
    Ok(Some((len, clear_hash)))
}

/// First pass over a delivered stream: rebuild both Merkle roots without a
/// key. The buyer runs this while saving the raw stream, and compares the
/// roots against the advertised commitments before funding a contract.
pub fn receive<R: Read>(stream: &mut R) -> CodecResult<Received> {
    let mut clear_tree = MerkleTree::new();
    let mut cipher_tree = MerkleTree::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    for index in 0u64.. {
        let Some((len, clear_hash)) = read_record(stream, index, &mut chunk)? else {
            break;
        };
        clear_tree.push_leaf_hash(clear_hash);
        cipher_tree.push_leaf_hash(leaf_hash(index, &chunk[..len]));
        if len < CHUNK_SIZE {
            // A short chunk means the reader hit EOF: the last record.
            break;
        }
    }

    Ok(Received {
        clear_root: clear_tree.root(),
        cipher_root: cipher_tree.root(),
        chunks: clear_tree.len(),
    })
}

/// Decrypt and verify a delivered stream.
///
/// Every decrypted chunk is written to `out` in index order. The cipher
/// commitment is checked first: if the recomputed cipher root disagrees with
/// `want_cipher_root` the transfer is cipher-inconsistent and the call fails
/// (this is detectable before any key reveal, so no funds are at risk).
/// Clear-side disagreement is not an error: it yields a [`Delivery::Bad`]
/// outcome whose witnesses feed refund claims.
pub fn decode<W: Write, R: Read>(
    out: &mut W,
    stream: &mut R,
    key: &[u8; 32],
    want_clear_root: &[u8; 32],
    want_cipher_root: &[u8; 32],
) -> CodecResult<Decoded> {
    let mut clear_tree = MerkleTree::new();
    let mut cipher_tree = MerkleTree::new();
    let mut witnesses = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    for index in 0u64.. {
        let Some((len, delivered_clear_hash)) = read_record(stream, index, &mut chunk)? else {
            break;
        };

        cipher_tree.push_leaf_hash(leaf_hash(index, &chunk[..len]));

        // The delivered clear hash always joins the tree: refund proofs must
        // fold against the committed clear root, witnesses included.
        clear_tree.push_leaf_hash(delivered_clear_hash);

        apply_keystream(key, index, &mut chunk[..len]);
        out.write_all(&chunk[..len])?;

        if leaf_hash(index, &chunk[..len]) != delivered_clear_hash {
            // Recover the ciphertext for the witness; XOR is involutive.
            let mut cipher_chunk = chunk[..len].to_vec();
            apply_keystream(key, index, &mut cipher_chunk);
            witnesses.push(FraudWitness {
                index,
                cipher_chunk,
                clear_hash: delivered_clear_hash,
            });
        }

        if len < CHUNK_SIZE {
            break;
        }
    }

    let cipher_root = cipher_tree.root();
    if cipher_root != *want_cipher_root {
        return Err(CodecError::CipherInconsistent {
            expected: hash_to_hex(want_cipher_root),
            actual: hash_to_hex(&cipher_root),
        });
    }

    let clear_root = clear_tree.root();
    let delivery = if witnesses.is_empty() && clear_root == *want_clear_root {
        Delivery::Good
    } else {
        Delivery::Bad { witnesses }
    };

    Ok(Decoded {
        clear_root,
        cipher_root,
        delivery,
        clear_tree,
        cipher_tree,
    })
}
