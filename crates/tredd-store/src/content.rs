//! The content tree: published files addressed by their clear root.
//!
//! Layout: `{root}/{clear root hex}/content` with a `content-type` sidecar.

use std::fs;
use std::path::{Path, PathBuf};

use tredd_core::clear_merkle_root;

use crate::error::{StoreError, StoreResult};

const CONTENT_FILE: &str = "content";
const CONTENT_TYPE_FILE: &str = "content-type";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone, Debug)]
pub struct ContentDir {
    root: PathBuf,
}

impl ContentDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_dir(&self, clear_root: &[u8; 32]) -> PathBuf {
        self.root.join(hex::encode(clear_root))
    }

    pub fn exists(&self, clear_root: &[u8; 32]) -> bool {
        self.entry_dir(clear_root).join(CONTENT_FILE).is_file()
    }

    /// Open the file committed to by `clear_root` for reading.
    ///
    /// Synchronous: callers stream it through the encoder from a blocking
    /// context.
    pub fn open(&self, clear_root: &[u8; 32]) -> StoreResult<fs::File> {
        let path = self.entry_dir(clear_root).join(CONTENT_FILE);
        match fs::File::open(&path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::ContentNotFound(hex::encode(clear_root)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The stored content type, or the octet-stream default.
    pub async fn content_type(&self, clear_root: &[u8; 32]) -> String {
        let path = self.entry_dir(clear_root).join(CONTENT_TYPE_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => s.trim().to_string(),
            Err(_) => DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    /// Publish a file: compute its clear root, copy it into the tree, and
    /// record its content type. Returns the clear root.
    pub fn install(&self, source: &Path, content_type: &str) -> StoreResult<[u8; 32]> {
        let mut file = fs::File::open(source)?;
        let clear_root =
            clear_merkle_root(&mut file).map_err(|e| StoreError::Backend(e.to_string()))?;

        let dir = self.entry_dir(&clear_root);
        fs::create_dir_all(&dir)?;
        fs::copy(source, dir.join(CONTENT_FILE))?;
        fs::write(dir.join(CONTENT_TYPE_FILE), content_type)?;
        Ok(clear_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn install_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let content_dir = ContentDir::new(dir.path());

        let source = dir.path().join("source.txt");
        fs::File::create(&source)
            .unwrap()
            .write_all(b"published bytes")
            .unwrap();

        let clear_root = content_dir.install(&source, "text/plain").unwrap();
        assert!(content_dir.exists(&clear_root));
        assert_eq!(content_dir.content_type(&clear_root).await, "text/plain");

        let mut served = String::new();
        use std::io::Read;
        content_dir
            .open(&clear_root)
            .unwrap()
            .read_to_string(&mut served)
            .unwrap();
        assert_eq!(served, "published bytes");
    }

    #[tokio::test]
    async fn missing_content_is_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let content_dir = ContentDir::new(dir.path());

        assert!(!content_dir.exists(&[9; 32]));
        assert!(matches!(
            content_dir.open(&[9; 32]).unwrap_err(),
            StoreError::ContentNotFound(_)
        ));
        assert_eq!(
            content_dir.content_type(&[9; 32]).await,
            "application/octet-stream"
        );
    }
}
