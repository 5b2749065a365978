//! Every (state, caller, call) combination outside the transition table
//! must reject without moving funds.

use tredd_contract::{Address, Contract, ContractParams, FraudClaim};

const BUYER: Address = Address([0xB0; 32]);
const SELLER: Address = Address([0x5E; 32]);
const STRANGER: Address = Address([0x66; 32]);

const REVEAL_DL: u64 = 1_000;
const REFUND_DL: u64 = 2_000;

fn params() -> ContractParams {
    ContractParams {
        buyer: BUYER,
        seller: SELLER,
        amount: 100,
        collateral: 150,
        asset_id: [0xAA; 32],
        clear_root: [1; 32],
        cipher_root: [2; 32],
        reveal_deadline_ms: REVEAL_DL,
        refund_deadline_ms: REFUND_DL,
    }
}

fn funded() -> Contract {
    Contract::deploy(params(), BUYER, 100, 0).unwrap()
}

fn revealed() -> Contract {
    let mut contract = funded();
    contract.reveal(SELLER, [7; 32], 150, 500).unwrap();
    contract
}

fn refunded() -> Contract {
    let mut contract = funded();
    contract.cancel(BUYER, REVEAL_DL + 1).unwrap();
    contract
}

fn claimed() -> Contract {
    let mut contract = revealed();
    contract.claim(SELLER, REFUND_DL + 1).unwrap();
    contract
}

fn junk_claim() -> FraudClaim {
    FraudClaim {
        index: 0,
        cipher_chunk: vec![0; 8],
        clear_hash: [0; 32],
        cipher_proof: Vec::new(),
        clear_proof: Vec::new(),
    }
}

/// Drive every call with every caller at every interesting time; return how
/// many succeeded. Funds must be untouched whenever a call errors.
fn assert_rejections(mut make: impl FnMut() -> Contract, expect_allowed: usize) {
    let callers = [BUYER, SELLER, STRANGER];
    let times = [0u64, REVEAL_DL, REVEAL_DL + 1, REFUND_DL, REFUND_DL + 1];

    let mut allowed = 0;
    for caller in callers {
        for now in times {
            for call in 0..4 {
                let mut contract = make();
                let held_before = contract.held();
                let status_before = contract.status();
                let result = match call {
                    0 => contract.reveal(caller, [7; 32], 150, now).map(|_| ()),
                    1 => contract.cancel(caller, now).map(|_| ()),
                    2 => contract.refund(caller, &junk_claim(), now).map(|_| ()),
                    _ => contract.claim(caller, now).map(|_| ()),
                };
                match result {
                    Ok(()) => allowed += 1,
                    Err(_) => {
                        assert_eq!(contract.held(), held_before);
                        assert_eq!(contract.status(), status_before);
                    }
                }
            }
        }
    }
    assert_eq!(allowed, expect_allowed);
}

#[test]
fn funded_state_allows_only_timely_reveal_and_late_cancel() {
    // reveal by the seller at the 2 probed times with now <= REVEAL_DL, plus
    // cancel by the buyer at the 3 probed times past REVEAL_DL.
    assert_rejections(funded, 2 + 3);
}

#[test]
fn revealed_state_allows_only_claim_after_window() {
    // Junk refund claims never verify, so the only permitted transition is
    // the seller's claim strictly after REFUND_DL.
    assert_rejections(revealed, 1);
}

#[test]
fn terminal_states_allow_nothing() {
    assert_rejections(refunded, 0);
    assert_rejections(claimed, 0);
}
