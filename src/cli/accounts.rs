use comfy_table::{Cell, Table};

use crate::db::{add_ledger, list_ledgers, open_existing};
use crate::error::Result;
use crate::models::LedgerKind;
use crate::settings::resolve_db_path;

pub fn add(kind: LedgerKind, db: Option<&str>, name: &str, institution: Option<&str>) -> Result<()> {
    let conn = open_existing(&resolve_db_path(db))?;
    let id = add_ledger(&conn, kind, name, institution)?;
    println!("Added {}: {name} (id {id})", kind.label());
    Ok(())
}

pub fn list(kind: LedgerKind, db: Option<&str>) -> Result<()> {
    let conn = open_existing(&resolve_db_path(db))?;
    let rows = list_ledgers(&conn, kind)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Institution"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(row.name),
            Cell::new(row.institution.unwrap_or_default()),
        ]);
    }
    let title = match kind {
        LedgerKind::Account => "Accounts",
        LedgerKind::Card => "Cards",
    };
    println!("{title}\n{table}");
    Ok(())
}
