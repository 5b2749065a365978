//! Merkle commitments over index-prefixed chunks.
//!
//! Leaves: `SHA-256(0x00 || varint(index) || data)`.
//! Internal nodes: `SHA-256(0x01 || left || right)`.
//! The 0x00/0x01 domain-separation prefix prevents second-preimage attacks
//! between leaves and internal nodes (RFC 6962).
//!
//! Trees over `n` leaves use the RFC 6962 shape: the root of a subtree
//! splits at the largest power of two strictly below `n`, so no leaf is ever
//! duplicated. The root of an empty tree is `SHA-256(0x00)`.

use sha2::{Digest, Sha256};

use crate::error::{ProofError, ProofResult};
use crate::varint::{put_uvarint, MAX_VARINT_LEN};

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;

/// Bytes per serialized proof entry: 32-byte sibling plus a direction flag.
const PROOF_ENTRY_LEN: usize = 33;

/// Hash a leaf: `SHA-256(0x00 || varint(index) || data)`.
pub fn leaf_hash(index: u64, data: &[u8]) -> [u8; 32] {
    let mut prefix = [0u8; MAX_VARINT_LEN];
    let n = put_uvarint(&mut prefix, index);

    let mut hasher = Sha256::new();
    hasher.update([LEAF_TAG]);
    hasher.update(&prefix[..n]);
    hasher.update(data);
    hasher.finalize().into()
}

fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_TAG]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn empty_root() -> [u8; 32] {
    Sha256::digest([LEAF_TAG]).into()
}

/// Largest power of two strictly less than `n`. Requires `n >= 2`.
fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k * 2 < n {
        k *= 2;
    }
    k
}

fn subtree_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            node_hash(&subtree_root(&leaves[..k]), &subtree_root(&leaves[k..]))
        }
    }
}

/// An incremental Merkle tree that retains its leaf hashes so inclusion
/// proofs can be produced after the fact.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    leaves: Vec<[u8; 32]>,
}

impl MerkleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `data` as the next leaf. The leaf index is the current length.
    pub fn push_item(&mut self, data: &[u8]) {
        let index = self.leaves.len() as u64;
        self.leaves.push(leaf_hash(index, data));
    }

    /// Append an already-computed leaf hash.
    pub fn push_leaf_hash(&mut self, hash: [u8; 32]) {
        self.leaves.push(hash);
    }

    pub fn len(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn root(&self) -> [u8; 32] {
        subtree_root(&self.leaves)
    }

    /// Inclusion proof for the leaf at `index`, sibling entries ordered
    /// leaf-adjacent first.
    pub fn prove(&self, index: u64) -> ProofResult<MerkleProof> {
        if index >= self.len() {
            return Err(ProofError::IndexOutOfRange {
                index,
                leaf_count: self.len(),
            });
        }

        let mut steps = Vec::new();
        path(&self.leaves, index as usize, &mut steps);
        Ok(MerkleProof { steps })
    }
}

fn path(leaves: &[[u8; 32]], index: usize, steps: &mut Vec<ProofStep>) {
    if leaves.len() < 2 {
        return;
    }
    let k = split_point(leaves.len());
    if index < k {
        path(&leaves[..k], index, steps);
        steps.push(ProofStep {
            sibling: subtree_root(&leaves[k..]),
            sibling_is_left: false,
        });
    } else {
        path(&leaves[k..], index - k, steps);
        steps.push(ProofStep {
            sibling: subtree_root(&leaves[..k]),
            sibling_is_left: true,
        });
    }
}

/// One level of a Merkle proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: [u8; 32],
    /// Whether the sibling sits to the left of the running hash.
    pub sibling_is_left: bool,
}

/// A Merkle inclusion proof, leaf-adjacent entry first.
///
/// The wire form is a flat byte sequence of 33-byte entries:
/// 32-byte sibling hash followed by a direction flag (1 = sibling is left).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleProof {
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Fold `leaf` through the proof and compare against `root`.
    pub fn verify(&self, leaf: &[u8; 32], root: &[u8; 32]) -> bool {
        let mut current = *leaf;
        for step in &self.steps {
            current = if step.sibling_is_left {
                node_hash(&step.sibling, &current)
            } else {
                node_hash(&current, &step.sibling)
            };
        }
        current == *root
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.steps.len() * PROOF_ENTRY_LEN);
        for step in &self.steps {
            out.extend_from_slice(&step.sibling);
            out.push(step.sibling_is_left as u8);
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> ProofResult<Self> {
        if data.len() % PROOF_ENTRY_LEN != 0 {
            return Err(ProofError::Malformed("length is not a multiple of 33"));
        }
        let mut steps = Vec::with_capacity(data.len() / PROOF_ENTRY_LEN);
        for entry in data.chunks_exact(PROOF_ENTRY_LEN) {
            let mut sibling = [0u8; 32];
            sibling.copy_from_slice(&entry[..32]);
            let sibling_is_left = match entry[32] {
                0 => false,
                1 => true,
                _ => return Err(ProofError::Malformed("direction flag must be 0 or 1")),
            };
            steps.push(ProofStep {
                sibling,
                sibling_is_left,
            });
        }
        Ok(Self { steps })
    }
}
