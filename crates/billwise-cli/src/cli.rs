//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Billwise - Understand where your money goes
#[derive(Parser)]
#[command(name = "billwise")]
#[command(about = "Personal finance analyzer with bill scanning and spending insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Store path (defaults to billwise.db or transactions.json by store kind)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Store kind: sqlite or json (defaults to BILLWISE_STORE, then sqlite)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the SQLite store is encrypted using SQLCipher.
    /// Set BILLWISE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the transaction store
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, /api requests need a bearer key from BILLWISE_API_KEYS.
        #[arg(long)]
        no_auth: bool,
    },

    /// Show spending insights
    Insights {
        /// Print the raw summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage transactions (list, add, delete)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Extract a bill from an image file
    Bill {
        /// Bill image (jpg, png, webp, gif, bmp, heic)
        #[arg(short, long)]
        file: PathBuf,

        /// Save the extracted bill as an expense
        #[arg(long)]
        save: bool,
    },

    /// Ask a question about your spending
    Ask {
        /// The question, e.g. "How much did I spend on groceries?"
        #[arg(required = true)]
        question: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Record a transaction by hand
    Add {
        /// Amount spent (or received with --income)
        #[arg(short, long)]
        amount: f64,

        /// Category (Groceries, Transport, Food, ...)
        #[arg(short, long)]
        category: Option<String>,

        /// Merchant name
        #[arg(short, long)]
        merchant: Option<String>,

        /// Purchase date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Record as income instead of an expense
        #[arg(long)]
        income: bool,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },
}
