//! Seller-side streaming encoder.

use std::io::{Read, Write};

use crate::error::CodecResult;
use crate::keystream::apply_keystream;
use crate::merkle::{leaf_hash, MerkleTree};
use crate::CHUNK_SIZE;

/// The pair of Merkle roots binding a seller to one (file, key, chunking).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commitment {
    pub clear_root: [u8; 32],
    pub cipher_root: [u8; 32],
}

/// Fill `buf` from `r`, tolerating short reads. Returns the number of bytes
/// read; fewer than `buf.len()` means the reader hit EOF.
pub(crate) fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Encode the content in `r` as a stream of `(clear hash, cipher chunk)`
/// records written to `w`, encrypting with the keystream derived from `key`.
///
/// Single pass: each chunk is read, committed in the clear domain,
/// encrypted in place, committed in the cipher domain, and emitted. Returns
/// both Merkle roots.
pub fn encode<W: Write, R: Read>(w: &mut W, r: &mut R, key: &[u8; 32]) -> CodecResult<Commitment> {
    let mut clear_tree = MerkleTree::new();
    let mut cipher_tree = MerkleTree::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    for index in 0u64.. {
        let n = read_full(r, &mut chunk)?;
        if n == 0 {
            break;
        }

        let clear_hash = leaf_hash(index, &chunk[..n]);
        clear_tree.push_leaf_hash(clear_hash);

        apply_keystream(key, index, &mut chunk[..n]);
        cipher_tree.push_leaf_hash(leaf_hash(index, &chunk[..n]));

        w.write_all(&clear_hash)?;
        w.write_all(&chunk[..n])?;

        if n < CHUNK_SIZE {
            break;
        }
    }

    Ok(Commitment {
        clear_root: clear_tree.root(),
        cipher_root: cipher_tree.root(),
    })
}

/// Compute only the cleartext Merkle root of `r`, without a key or output.
///
/// This is the identifier under which content is published and requested.
pub fn clear_merkle_root<R: Read>(r: &mut R) -> CodecResult<[u8; 32]> {
    let mut tree = MerkleTree::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let n = read_full(r, &mut chunk)?;
        if n == 0 {
            break;
        }
        tree.push_item(&chunk[..n]);
        if n < CHUNK_SIZE {
            break;
        }
    }

    Ok(tree.root())
}
