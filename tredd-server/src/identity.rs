//! Seller identity persistence.

use std::fs;
use std::path::Path;

use anyhow::Context;
use rand::RngCore;
use tredd_contract::Address;

/// Load the seller's 32-byte address from `path`, generating and saving a
/// fresh one on first run.
pub fn load_or_generate(path: &Path) -> anyhow::Result<Address> {
    if path.exists() {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let raw: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow::anyhow!("{} must hold exactly 32 bytes", path.display()))?;
        Ok(Address(raw))
    } else {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "generated new seller identity");
        Ok(Address(raw))
    }
}
