use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root of the published content tree.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// File holding the seller's 32-byte address; generated on first run.
    #[serde(default = "default_seller_key_path")]
    pub seller_key_path: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: String, // "sled", "memory"
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_backend")]
    pub backend: String, // "memory"
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_ledger_backend(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Minimum lead time a requested reveal deadline must have.
    #[serde(default = "default_min_reveal_lead_ms")]
    pub min_reveal_lead_ms: u64,
    /// Longest reveal-to-refund window the seller will accept.
    #[serde(default = "default_max_refund_window_ms")]
    pub max_refund_window_ms: u64,
    /// How long after the refund deadline the claim fires.
    #[serde(default = "default_claim_grace_ms")]
    pub claim_grace_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_reveal_lead_ms: default_min_reveal_lead_ms(),
            max_refund_window_ms: default_max_refund_window_ms(),
            claim_grace_ms: default_claim_grace_ms(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    20544
}
fn default_content_dir() -> String {
    "content".into()
}
fn default_seller_key_path() -> String {
    "seller.key".into()
}
fn default_store_backend() -> String {
    "sled".into()
}
fn default_store_path() -> String {
    "tredd-db".into()
}
fn default_ledger_backend() -> String {
    "memory".into()
}
fn default_min_reveal_lead_ms() -> u64 {
    10 * 60 * 1000
} // 10 minutes
fn default_max_refund_window_ms() -> u64 {
    60 * 60 * 1000
} // 1 hour
fn default_claim_grace_ms() -> u64 {
    1_000
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file("tredd-server.toml"))
            .merge(Env::prefixed("TREDD_"))
            .extract()?;
        Ok(config)
    }
}
