//! Server command implementation

use anyhow::{Context, Result};
use billwise_server::{ServerConfig, ALLOWED_ORIGINS_ENV, API_KEYS_ENV};

use super::{open_store, StoreArgs};

pub async fn cmd_serve(args: &StoreArgs, host: &str, port: u16, no_auth: bool) -> Result<()> {
    let store = open_store(args)?;
    let config = ServerConfig::from_env(!no_auth);

    println!("🚀 Starting Billwise web server...");
    println!("   Store: {} ({})", store.path(), store.kind());
    println!("   Listening: http://{}:{}", host, port);

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if config.api_keys.is_empty() {
        println!("   🔒 Authentication: enabled, but no keys set");
        println!("      Set {} to allow API access", API_KEYS_ENV);
    } else {
        println!(
            "   🔑 API keys: {} configured ({})",
            config.api_keys.len(),
            API_KEYS_ENV
        );
    }

    if !config.allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} ({})",
            config.allowed_origins.join(", "),
            ALLOWED_ORIGINS_ENV
        );
    }
    println!();

    billwise_server::serve_with_config(store, host, port, config)
        .await
        .context("Server error")
}
