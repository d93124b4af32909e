use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::importer::{import_file, read_statement};
use crate::models::LedgerTarget;
use crate::settings::resolve_db_path;

pub fn run(file: &str, db: Option<&str>, account_id: Option<i64>, card_id: Option<i64>) -> Result<()> {
    let parsed = read_statement(&PathBuf::from(file))?;
    let found = parsed.statement.transactions.len();

    if found == 0 {
        println!("{} No transactions found in OFX file", "[WARN]".yellow());
        return Ok(());
    }

    println!(
        "{} Found {} transactions, ACCTID: {}",
        "[INFO]".cyan(),
        found,
        parsed.statement.account_id.as_deref().unwrap_or("(none)")
    );

    let target = LedgerTarget { account_id, card_id };
    let Some(result) = import_file(&resolve_db_path(db), &parsed, target)? else {
        return Ok(());
    };

    println!(
        "{} Inserted: {}, Skipped (duplicates): {}",
        "[OK]".green(),
        result.inserted,
        result.skipped
    );
    Ok(())
}
