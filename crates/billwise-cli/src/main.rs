//! Billwise CLI - Personal finance analyzer
//!
//! Usage:
//!   billwise init                   Create the transaction store
//!   billwise bill --file IMAGE      Extract a bill from a photo
//!   billwise insights               Show spending insights
//!   billwise serve --port 8000      Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let store_args = commands::StoreArgs {
        db: cli.db.clone(),
        store: cli.store.clone(),
        no_encrypt: cli.no_encrypt,
    };

    match cli.command {
        Commands::Init => commands::cmd_init(&store_args),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&store_args, &host, port, no_auth).await,
        Commands::Insights { json } => {
            let store = commands::open_store(&store_args)?;
            commands::cmd_insights(&store, json)
        }
        Commands::Transactions { action } => {
            let store = commands::open_store(&store_args)?;
            match action {
                None => commands::cmd_transactions_list(&store, 20),
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&store, limit)
                }
                Some(TransactionsAction::Add {
                    amount,
                    category,
                    merchant,
                    date,
                    income,
                }) => commands::cmd_transactions_add(
                    &store,
                    amount,
                    category.as_deref(),
                    merchant.as_deref(),
                    date.as_deref(),
                    income,
                ),
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&store, id)
                }
            }
        }
        Commands::Bill { file, save } => {
            let store = commands::open_store(&store_args)?;
            commands::cmd_bill(&store, &file, save).await
        }
        Commands::Ask { question } => {
            let store = commands::open_store(&store_args)?;
            commands::cmd_ask(&store, &question.join(" ")).await
        }
    }
}
