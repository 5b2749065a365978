use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tredd_core::clear_merkle_root;
use tredd_store::ContentDir;

#[derive(Args)]
pub struct HashArgs {
    /// File to hash
    pub file: PathBuf,

    /// Publish the file into this content tree root
    #[arg(long)]
    pub publish: Option<PathBuf>,

    /// Content type recorded alongside published content
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,
}

pub fn run(args: HashArgs) -> Result<()> {
    let clear_root = match &args.publish {
        Some(root) => ContentDir::new(root)
            .install(&args.file, &args.content_type)
            .with_context(|| format!("publishing {}", args.file.display()))?,
        None => {
            let mut file =
                File::open(&args.file).with_context(|| format!("opening {}", args.file.display()))?;
            clear_merkle_root(&mut file)?
        }
    };

    println!("{}", hex::encode(clear_root));
    Ok(())
}
