//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_store` - Shared utility to open the configured transaction store
//! - `cmd_init` - Create the store

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use billwise_core::ai::AIClient;
use billwise_core::storage::{Storage, StoreKind};

/// Global store flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct StoreArgs {
    pub db: Option<PathBuf>,
    pub store: Option<String>,
    pub no_encrypt: bool,
}

impl StoreArgs {
    /// Store kind: `--store`, then `BILLWISE_STORE`, then sqlite
    pub fn kind(&self) -> Result<StoreKind> {
        match self.store.as_deref() {
            Some(flag) => flag.parse().map_err(|e: String| anyhow!(e)),
            None => Ok(StoreKind::from_env().unwrap_or_default()),
        }
    }

    /// Store path: `--db`, or the kind's default file name
    pub fn path(&self, kind: StoreKind) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| PathBuf::from(kind.default_path()))
    }
}

/// Open the store, encrypted by default for SQLite unless --no-encrypt
pub fn open_store(args: &StoreArgs) -> Result<Storage> {
    let kind = args.kind()?;
    let path = args.path(kind);
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Store path is not valid UTF-8: {}", path.display()))?;

    Storage::open(kind, path_str, !args.no_encrypt)
        .with_context(|| format!("Failed to open {} store at {}", kind, path.display()))
}

/// AI client from the environment, or an error explaining how to configure one
pub fn require_ai() -> Result<AIClient> {
    AIClient::from_env().ok_or_else(|| {
        anyhow!(
            "AI backend not configured. Set OLLAMA_HOST (or AI_BACKEND=openai_compatible \
             with OPENAI_COMPATIBLE_HOST)."
        )
    })
}

pub fn cmd_init(args: &StoreArgs) -> Result<()> {
    let kind = args.kind()?;
    let path = args.path(kind);
    println!("🔧 Initializing {} store at {}...", kind, path.display());

    open_store(args)?;

    match kind {
        StoreKind::Sqlite if args.no_encrypt => {
            println!("   ⚠️  Encryption: DISABLED (--no-encrypt)")
        }
        StoreKind::Sqlite => println!("   🔒 Encryption: ENABLED"),
        StoreKind::Json => println!("   ⚠️  Encryption: not available for JSON stores"),
    }

    println!("✅ Store initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Scan a bill: billwise bill --file receipt.jpg --save");
    println!("  2. Start web UI: billwise serve");

    Ok(())
}
