pub mod accounts;
pub mod history;
pub mod import;
pub mod init;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ofxload", version, about = "Import OFX bank and credit card statements into a SQLite ledger.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger tables and seed default categories.
    Init {
        /// Database path (saved as the default for later commands)
        #[arg(long)]
        db: Option<String>,
    },
    /// Import an OFX statement, skipping transactions already in the ledger.
    Import {
        /// Path to the .ofx file
        file: String,
        /// Database path (default: the one chosen at `ofxload init`)
        #[arg(long)]
        db: Option<String>,
        /// Bank account the transactions belong to
        #[arg(long = "account-id")]
        account_id: Option<i64>,
        /// Credit card the transactions belong to
        #[arg(long = "card-id")]
        card_id: Option<i64>,
    },
    /// Manage bank accounts that imports can target.
    Accounts {
        #[command(subcommand)]
        command: LedgerCommands,
    },
    /// Manage credit cards that imports can target.
    Cards {
        #[command(subcommand)]
        command: LedgerCommands,
    },
    /// List previous imports.
    History {
        /// Database path (default: the one chosen at `ofxload init`)
        #[arg(long)]
        db: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Add a new entry and print its id.
    Add {
        /// Name, e.g. 'Itau Checking'
        name: String,
        /// Institution name
        #[arg(long)]
        institution: Option<String>,
        /// Database path (default: the one chosen at `ofxload init`)
        #[arg(long)]
        db: Option<String>,
    },
    /// List all entries with their ids.
    List {
        /// Database path (default: the one chosen at `ofxload init`)
        #[arg(long)]
        db: Option<String>,
    },
}
