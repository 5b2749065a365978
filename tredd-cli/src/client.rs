// API client for the seller daemon and its hosted ledger

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

pub struct ApiClient {
    client: Client,
    server_url: String,
}

#[derive(Serialize)]
pub struct DeliveryRequest {
    pub clear_root: String,
    pub amount: u64,
    pub asset_id: String,
    pub reveal_deadline_ms: u64,
    pub refund_deadline_ms: u64,
}

/// Delivery metadata; the stream itself lands in a file.
pub struct Delivery {
    pub transfer_id: String,
    pub cipher_root: String,
    pub content_type: String,
}

#[derive(Serialize)]
pub struct DeployRequest {
    pub buyer: String,
    pub seller: String,
    pub amount: u64,
    pub collateral: u64,
    pub asset_id: String,
    pub clear_root: String,
    pub cipher_root: String,
    pub reveal_deadline_ms: u64,
    pub refund_deadline_ms: u64,
    pub payment: u64,
}

#[derive(Deserialize)]
struct DeployResponse {
    contract_id: String,
}

/// The slice of the chain's contract view the buyer acts on.
#[derive(Deserialize)]
pub struct ContractView {
    pub key: Option<String>,
    pub reveal_deadline_ms: u64,
    pub now_ms: u64,
}

#[derive(Serialize)]
pub struct RefundRequest {
    pub caller: String,
    pub index: u64,
    pub cipher_chunk: String,
    pub clear_hash: String,
    pub cipher_proof: String,
    pub clear_proof: String,
}

impl ApiClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// Request delivery, saving the raw record stream to `save_to`.
    pub async fn request_delivery(
        &self,
        request: &DeliveryRequest,
        save_to: &Path,
    ) -> Result<Delivery> {
        let response = self
            .client
            .post(format!("{}/request", self.server_url))
            .json(request)
            .send()
            .await
            .context("failed to send delivery request")?;
        let mut response = error_for_status(response).await?;

        let header = |name: &str| -> Result<String> {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
                .with_context(|| format!("missing {name} response header"))
        };
        let delivery = Delivery {
            transfer_id: header("x-tredd-transfer-id")?,
            cipher_root: header("x-tredd-cipher-root")?,
            content_type: header("content-type")?,
        };

        let mut file = tokio::fs::File::create(save_to)
            .await
            .with_context(|| format!("creating {}", save_to.display()))?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(delivery)
    }

    /// Hand the deployed contract to the seller so it reveals the key.
    pub async fn propose_reveal(&self, transfer_id: &str, contract_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/reveal", self.server_url))
            .header("x-tredd-transfer-id", transfer_id)
            .json(&serde_json::json!({ "contract_id": contract_id }))
            .send()
            .await
            .context("failed to send reveal proposal")?;
        error_for_status(response).await?;
        Ok(())
    }

    pub async fn deploy(&self, request: &DeployRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/ledger/deploy", self.server_url))
            .json(request)
            .send()
            .await
            .context("failed to send deploy request")?;
        let response = error_for_status(response).await?;
        let deployed: DeployResponse = response.json().await?;
        Ok(deployed.contract_id)
    }

    pub async fn contract(&self, contract_id: &str) -> Result<ContractView> {
        let response = self
            .client
            .get(format!("{}/ledger/contracts/{contract_id}", self.server_url))
            .send()
            .await
            .context("failed to query contract")?;
        let response = error_for_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn cancel(&self, contract_id: &str, caller: &str) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/ledger/contracts/{contract_id}/cancel",
                self.server_url
            ))
            .json(&serde_json::json!({ "caller": caller }))
            .send()
            .await
            .context("failed to send cancel")?;
        error_for_status(response).await?;
        Ok(())
    }

    pub async fn refund(&self, contract_id: &str, request: &RefundRequest) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/ledger/contracts/{contract_id}/refund",
                self.server_url
            ))
            .json(request)
            .send()
            .await
            .context("failed to send refund claim")?;
        error_for_status(response).await?;
        Ok(())
    }
}

/// Surface the server's `{"error": ...}` message on failure.
async fn error_for_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or_else(|| "no detail".into());
    anyhow::bail!("server returned {status}: {message}")
}
