mod cli;
mod db;
mod error;
mod importer;
mod models;
mod ofx;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, LedgerCommands};
use models::LedgerKind;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { db } => cli::init::run(db),
        Commands::Import {
            file,
            db,
            account_id,
            card_id,
        } => cli::import::run(&file, db.as_deref(), account_id, card_id),
        Commands::Accounts { command } => run_ledger(LedgerKind::Account, command),
        Commands::Cards { command } => run_ledger(LedgerKind::Card, command),
        Commands::History { db } => cli::history::run(db.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_ledger(kind: LedgerKind, command: LedgerCommands) -> error::Result<()> {
    match command {
        LedgerCommands::Add {
            name,
            institution,
            db,
        } => cli::accounts::add(kind, db.as_deref(), &name, institution.as_deref()),
        LedgerCommands::List { db } => cli::accounts::list(kind, db.as_deref()),
    }
}
