//! Full two-party exchanges driven over the in-process ledger: codec on
//! both ends, contract in the middle.

use std::io::Cursor;

use tredd_contract::{
    Address, ContractError, ContractParams, ContractStatus, FraudClaim, Ledger, LedgerError,
    MemoryLedger,
};
use tredd_core::{decode, encode, leaf_hash, Delivery, MerkleTree, CHUNK_SIZE};

const BUYER: Address = Address([0xB0; 32]);
const SELLER: Address = Address([0x5E; 32]);
const ASSET: [u8; 32] = [0xA5; 32];
const AMOUNT: u64 = 500;
const COLLATERAL: u64 = 600;

const REVEAL_WINDOW_MS: u64 = 60_000;
const REFUND_WINDOW_MS: u64 = 120_000;

fn params(ledger: &MemoryLedger, clear_root: [u8; 32], cipher_root: [u8; 32]) -> ContractParams {
    let now = ledger.now_ms();
    ContractParams {
        buyer: BUYER,
        seller: SELLER,
        amount: AMOUNT,
        collateral: COLLATERAL,
        asset_id: ASSET,
        clear_root,
        cipher_root,
        reveal_deadline_ms: now + REVEAL_WINDOW_MS,
        refund_deadline_ms: now + REVEAL_WINDOW_MS + REFUND_WINDOW_MS,
    }
}

#[tokio::test]
async fn honest_transfer_settles_to_seller() {
    let content = vec![b'A'; 3 * CHUNK_SIZE];
    let key = [0x01u8; 32];

    // Seller encodes; buyer learns the clear root out of band.
    let mut stream = Vec::new();
    let commitment = encode(&mut stream, &mut Cursor::new(&content), &key).unwrap();

    let ledger = MemoryLedger::new();
    let id = ledger
        .deploy(
            BUYER,
            params(&ledger, commitment.clear_root, commitment.cipher_root),
            AMOUNT,
        )
        .await
        .unwrap();

    ledger.reveal(&id, SELLER, key, COLLATERAL).await.unwrap();

    // Buyer decrypts with the published key and finds nothing to dispute.
    let revealed_key = ledger.snapshot(&id).await.unwrap().key.unwrap();
    let mut plaintext = Vec::new();
    let decoded = decode(
        &mut plaintext,
        &mut Cursor::new(&stream),
        &revealed_key,
        &commitment.clear_root,
        &commitment.cipher_root,
    )
    .unwrap();
    assert_eq!(plaintext, content);
    assert!(decoded.is_good());

    ledger.advance(REVEAL_WINDOW_MS + REFUND_WINDOW_MS + 1);
    ledger.claim(&id, SELLER).await.unwrap();

    let payouts = ledger.payouts();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].to, SELLER);
    assert_eq!(payouts[0].amount, AMOUNT + COLLATERAL);
    assert_eq!(payouts[0].asset_id, ASSET);
}

#[tokio::test]
async fn wrong_commitment_is_refunded_with_fraud_proof() {
    // The seller streams honest ciphertext for `content` but delivers the
    // clear hashes of `advertised`, which is also the root the buyer was
    // sold on.
    let content = vec![0x11u8; 2 * CHUNK_SIZE];
    let advertised = vec![0x22u8; 2 * CHUNK_SIZE];
    let key = [0x0Fu8; 32];

    let mut stream = Vec::new();
    let commitment = encode(&mut stream, &mut Cursor::new(&content), &key).unwrap();

    let mut advertised_tree = MerkleTree::new();
    for (i, chunk) in advertised.chunks(CHUNK_SIZE).enumerate() {
        let leaf = leaf_hash(i as u64, chunk);
        advertised_tree.push_leaf_hash(leaf);
        let offset = i * (32 + CHUNK_SIZE);
        stream[offset..offset + 32].copy_from_slice(&leaf);
    }
    let advertised_root = advertised_tree.root();

    let ledger = MemoryLedger::new();
    let id = ledger
        .deploy(
            BUYER,
            params(&ledger, advertised_root, commitment.cipher_root),
            AMOUNT,
        )
        .await
        .unwrap();
    ledger.reveal(&id, SELLER, key, COLLATERAL).await.unwrap();

    let decoded = decode(
        &mut Vec::new(),
        &mut Cursor::new(&stream),
        &key,
        &advertised_root,
        &commitment.cipher_root,
    )
    .unwrap();
    let Delivery::Bad { witnesses } = decoded.delivery() else {
        panic!("expected tampering to surface");
    };

    let witness = &witnesses[0];
    let claim = FraudClaim {
        index: witness.index,
        cipher_chunk: witness.cipher_chunk.clone(),
        clear_hash: witness.clear_hash,
        cipher_proof: decoded.prove_cipher(witness.index).unwrap().to_bytes(),
        clear_proof: decoded.prove_clear(witness.index).unwrap().to_bytes(),
    };
    ledger.refund(&id, BUYER, claim).await.unwrap();

    let payouts = ledger.payouts();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].to, BUYER);
    assert_eq!(payouts[0].amount, AMOUNT + COLLATERAL);

    let snap = ledger.snapshot(&id).await.unwrap();
    assert_eq!(snap.status, ContractStatus::Refunded);

    // The window has shut for the seller.
    ledger.advance(REVEAL_WINDOW_MS + REFUND_WINDOW_MS + 1);
    assert!(matches!(
        ledger.claim(&id, SELLER).await.unwrap_err(),
        LedgerError::Contract(ContractError::WrongState { .. })
    ));
}

#[tokio::test]
async fn silent_seller_lets_the_buyer_cancel() {
    let ledger = MemoryLedger::new();
    let id = ledger
        .deploy(BUYER, params(&ledger, [1; 32], [2; 32]), AMOUNT)
        .await
        .unwrap();

    // No cancelling while the seller may still answer.
    assert!(matches!(
        ledger.cancel(&id, BUYER).await.unwrap_err(),
        LedgerError::Contract(ContractError::DeadlineNotReached)
    ));

    ledger.advance(REVEAL_WINDOW_MS + 1);
    ledger.cancel(&id, BUYER).await.unwrap();

    // Payment only: no collateral was ever deposited.
    let payouts = ledger.payouts();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].to, BUYER);
    assert_eq!(payouts[0].amount, AMOUNT);
}

#[tokio::test]
async fn empty_file_transfer_is_honest() {
    let key = [0x42u8; 32];
    let mut stream = Vec::new();
    let commitment = encode(&mut stream, &mut Cursor::new(&[][..]), &key).unwrap();
    assert!(stream.is_empty());

    let ledger = MemoryLedger::new();
    let id = ledger
        .deploy(
            BUYER,
            params(&ledger, commitment.clear_root, commitment.cipher_root),
            AMOUNT,
        )
        .await
        .unwrap();
    ledger.reveal(&id, SELLER, key, COLLATERAL).await.unwrap();

    let decoded = decode(
        &mut Vec::new(),
        &mut Cursor::new(&stream),
        &key,
        &commitment.clear_root,
        &commitment.cipher_root,
    )
    .unwrap();
    assert!(decoded.is_good());

    ledger.advance(REVEAL_WINDOW_MS + REFUND_WINDOW_MS + 1);
    ledger.claim(&id, SELLER).await.unwrap();
    assert_eq!(ledger.payouts()[0].amount, AMOUNT + COLLATERAL);
}

#[tokio::test]
async fn accounting_balances_for_every_terminal_path() {
    // Exercise all three terminal paths and check the conservation rule:
    // payout equals payment plus collateral iff the contract was revealed.
    let ledger = MemoryLedger::new();

    // cancel path
    let cancel_id = ledger
        .deploy(BUYER, params(&ledger, [1; 32], [2; 32]), AMOUNT)
        .await
        .unwrap();

    // claim path
    let content = vec![9u8; CHUNK_SIZE];
    let key = [3u8; 32];
    let mut stream = Vec::new();
    let commitment = encode(&mut stream, &mut Cursor::new(&content), &key).unwrap();
    let claim_id = ledger
        .deploy(
            BUYER,
            params(&ledger, commitment.clear_root, commitment.cipher_root),
            AMOUNT,
        )
        .await
        .unwrap();
    ledger
        .reveal(&claim_id, SELLER, key, COLLATERAL)
        .await
        .unwrap();

    ledger.advance(REVEAL_WINDOW_MS + REFUND_WINDOW_MS + 1);
    ledger.cancel(&cancel_id, BUYER).await.unwrap();
    ledger.claim(&claim_id, SELLER).await.unwrap();

    let payouts = ledger.payouts();
    assert_eq!(payouts.len(), 2);
    assert_eq!(payouts[0].amount, AMOUNT); // never revealed
    assert_eq!(payouts[1].amount, AMOUNT + COLLATERAL); // revealed
}
