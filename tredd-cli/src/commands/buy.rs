use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tredd_contract::Address;
use tredd_core::{decode, hash_from_hex, receive, Delivery};

use crate::client::{ApiClient, DeliveryRequest, DeployRequest, RefundRequest};

#[derive(Args)]
pub struct BuyArgs {
    /// Clear root of the content, from the seller's catalog
    #[arg(long)]
    pub clear_root: String,

    /// Buyer address (64 hex characters)
    #[arg(long, env = "TREDD_BUYER")]
    pub buyer: Address,

    /// Seller address, from the seller's catalog
    #[arg(long)]
    pub seller: Address,

    /// Payment amount
    #[arg(long)]
    pub amount: u64,

    /// Collateral the seller must stake (at least the amount)
    #[arg(long)]
    pub collateral: u64,

    /// Asset identifier (64 hex characters)
    #[arg(long)]
    pub asset_id: String,

    /// How long the seller has to reveal the key
    #[arg(long, default_value_t = 15 * 60 * 1000)]
    pub reveal_window_ms: u64,

    /// How long after the reveal deadline fraud proofs are accepted
    #[arg(long, default_value_t = 30 * 60 * 1000)]
    pub refund_window_ms: u64,

    /// Where the decrypted file is written
    #[arg(long)]
    pub out: PathBuf,
}

pub async fn run(server: &str, args: BuyArgs) -> Result<()> {
    let expected_clear_root =
        hash_from_hex(&args.clear_root).context("clear root must be 64 hex characters")?;
    let client = ApiClient::new(server);

    // Deadlines are anchored to the chain clock, read off any contract
    // query; before the first one exists, local wall-clock is close enough
    // for windows measured in minutes.
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .context("system clock before the epoch")?
        .as_millis() as u64;
    let reveal_deadline_ms = now_ms + args.reveal_window_ms;
    let refund_deadline_ms = reveal_deadline_ms + args.refund_window_ms;

    // 1. Fetch the stream and rebuild both commitments locally.
    let stream_file = tempfile::NamedTempFile::new().context("creating stream scratch file")?;
    let delivery = client
        .request_delivery(
            &DeliveryRequest {
                clear_root: args.clear_root.clone(),
                amount: args.amount,
                asset_id: args.asset_id.clone(),
                reveal_deadline_ms,
                refund_deadline_ms,
            },
            stream_file.path(),
        )
        .await?;
    println!(
        "transfer {} received ({})",
        delivery.transfer_id, delivery.content_type
    );

    let received = {
        let mut reader = BufReader::new(File::open(stream_file.path())?);
        receive(&mut reader)?
    };
    if received.clear_root != expected_clear_root {
        bail!("delivered content does not match the catalog clear root; abandoning before payment");
    }
    let advertised_cipher_root =
        hash_from_hex(&delivery.cipher_root).context("malformed cipher root header")?;
    if received.cipher_root != advertised_cipher_root {
        bail!("delivered ciphertext does not match the advertised cipher root; abandoning before payment");
    }

    // 2. Fund the contract.
    let contract_id = client
        .deploy(&DeployRequest {
            buyer: args.buyer.to_hex(),
            seller: args.seller.to_hex(),
            amount: args.amount,
            collateral: args.collateral,
            asset_id: args.asset_id.clone(),
            clear_root: args.clear_root.clone(),
            cipher_root: delivery.cipher_root.clone(),
            reveal_deadline_ms,
            refund_deadline_ms,
            payment: args.amount,
        })
        .await?;
    println!("contract {contract_id} funded with {}", args.amount);

    // 3. Ask the seller to reveal, then watch the chain for the key.
    client
        .propose_reveal(&delivery.transfer_id, &contract_id)
        .await?;

    let key = loop {
        let view = client.contract(&contract_id).await?;
        if let Some(key_hex) = view.key {
            break hash_from_hex(&key_hex).context("malformed revealed key")?;
        }
        if view.now_ms > view.reveal_deadline_ms {
            client.cancel(&contract_id, &args.buyer.to_hex()).await?;
            println!("seller never revealed; payment cancelled back to buyer");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    };
    println!("key revealed");

    // 4. Decrypt, verify, and dispute if anything disagrees.
    let mut out = File::create(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let decoded = {
        let mut reader = BufReader::new(File::open(stream_file.path())?);
        decode(
            &mut out,
            &mut reader,
            &key,
            &expected_clear_root,
            &received.cipher_root,
        )?
    };

    match decoded.delivery() {
        Delivery::Good => {
            println!("content verified and written to {}", args.out.display());
        }
        Delivery::Bad { witnesses } => {
            let witness = witnesses
                .first()
                .context("delivery disagreed with the commitment but produced no witness")?;
            client
                .refund(
                    &contract_id,
                    &RefundRequest {
                        caller: args.buyer.to_hex(),
                        index: witness.index,
                        cipher_chunk: hex::encode(&witness.cipher_chunk),
                        clear_hash: hex::encode(witness.clear_hash),
                        cipher_proof: hex::encode(
                            decoded.prove_cipher(witness.index)?.to_bytes(),
                        ),
                        clear_proof: hex::encode(decoded.prove_clear(witness.index)?.to_bytes()),
                    },
                )
                .await?;
            println!(
                "chunk {} was tampered with; payment and collateral refunded",
                witness.index
            );
        }
    }

    Ok(())
}
