//! Contract-side fraud adjudication.

use crate::keystream::apply_keystream;
use crate::merkle::{leaf_hash, MerkleProof};
use crate::CHUNK_SIZE;

/// Decide whether a refund claim proves tampering.
///
/// Both proofs must fold to their committed roots: `cipher_proof` places the
/// claimed cipher chunk at `index` under `cipher_root`, and `clear_proof`
/// places the delivered `clear_hash` at `index` under `clear_root`. The
/// claim is valid precisely when the chunk's decryption under `key` does NOT
/// hash to the committed `clear_hash`.
///
/// The proof folds run before the keystream work, so out-of-range or
/// garbage claims are rejected without touching the cipher chunk.
pub fn verify_fraud(
    index: u64,
    cipher_chunk: &[u8],
    clear_hash: &[u8; 32],
    cipher_proof: &MerkleProof,
    clear_proof: &MerkleProof,
    cipher_root: &[u8; 32],
    clear_root: &[u8; 32],
    key: &[u8; 32],
) -> bool {
    if cipher_chunk.is_empty() || cipher_chunk.len() > CHUNK_SIZE {
        return false;
    }

    let cipher_leaf = leaf_hash(index, cipher_chunk);
    if !cipher_proof.verify(&cipher_leaf, cipher_root) {
        return false;
    }
    if !clear_proof.verify(clear_hash, clear_root) {
        return false;
    }

    let mut clear_chunk = cipher_chunk.to_vec();
    apply_keystream(key, index, &mut clear_chunk);
    leaf_hash(index, &clear_chunk) != *clear_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::MerkleTree;

    fn commit(chunks: &[&[u8]], key: &[u8; 32]) -> (MerkleTree, MerkleTree, Vec<Vec<u8>>) {
        let mut clear_tree = MerkleTree::new();
        let mut cipher_tree = MerkleTree::new();
        let mut cipher_chunks = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            clear_tree.push_item(chunk);
            let mut cipher = chunk.to_vec();
            apply_keystream(key, i as u64, &mut cipher);
            cipher_tree.push_leaf_hash(leaf_hash(i as u64, &cipher));
            cipher_chunks.push(cipher);
        }
        (clear_tree, cipher_tree, cipher_chunks)
    }

    #[test]
    fn honest_chunks_are_not_fraud() {
        let key = [2u8; 32];
        let chunks: Vec<Vec<u8>> = (0..4).map(|i| vec![i as u8; 64]).collect();
        let refs: Vec<&[u8]> = chunks.iter().map(|c| c.as_slice()).collect();
        let (clear_tree, cipher_tree, cipher_chunks) = commit(&refs, &key);

        for i in 0..4u64 {
            assert!(!verify_fraud(
                i,
                &cipher_chunks[i as usize],
                &leaf_hash(i, &chunks[i as usize]),
                &cipher_tree.prove(i).unwrap(),
                &clear_tree.prove(i).unwrap(),
                &cipher_tree.root(),
                &clear_tree.root(),
                &key,
            ));
        }
    }

    #[test]
    fn mismatched_clear_hash_is_fraud() {
        let key = [2u8; 32];
        let chunks: Vec<Vec<u8>> = (0..4).map(|i| vec![i as u8; 64]).collect();
        let refs: Vec<&[u8]> = chunks.iter().map(|c| c.as_slice()).collect();
        let (_, cipher_tree, cipher_chunks) = commit(&refs, &key);

        // Seller committed clear hashes for different content.
        let mut lying_clear_tree = MerkleTree::new();
        for i in 0..4u64 {
            lying_clear_tree.push_leaf_hash(leaf_hash(i, b"something else"));
        }

        assert!(verify_fraud(
            1,
            &cipher_chunks[1],
            &leaf_hash(1, b"something else"),
            &cipher_tree.prove(1).unwrap(),
            &lying_clear_tree.prove(1).unwrap(),
            &cipher_tree.root(),
            &lying_clear_tree.root(),
            &key,
        ));
    }

    #[test]
    fn unproven_chunk_is_rejected() {
        let key = [2u8; 32];
        let chunks: Vec<Vec<u8>> = (0..4).map(|i| vec![i as u8; 64]).collect();
        let refs: Vec<&[u8]> = chunks.iter().map(|c| c.as_slice()).collect();
        let (clear_tree, cipher_tree, cipher_chunks) = commit(&refs, &key);

        // Tampered chunk whose cipher proof cannot fold.
        let mut tampered = cipher_chunks[0].clone();
        tampered[0] ^= 1;
        assert!(!verify_fraud(
            0,
            &tampered,
            &leaf_hash(0, &chunks[0]),
            &cipher_tree.prove(0).unwrap(),
            &clear_tree.prove(0).unwrap(),
            &cipher_tree.root(),
            &clear_tree.root(),
            &key,
        ));
    }

    #[test]
    fn oversized_or_empty_chunks_are_rejected() {
        let key = [0u8; 32];
        let proof = MerkleProof::default();
        assert!(!verify_fraud(
            0,
            &[],
            &[0u8; 32],
            &proof,
            &proof,
            &[0u8; 32],
            &[0u8; 32],
            &key,
        ));
        let huge = vec![0u8; CHUNK_SIZE + 1];
        assert!(!verify_fraud(
            0,
            &huge,
            &[0u8; 32],
            &proof,
            &proof,
            &[0u8; 32],
            &[0u8; 32],
            &key,
        ));
    }
}
