use comfy_table::{Cell, Table};

use crate::db::{list_imports, open_existing};
use crate::error::Result;
use crate::settings::resolve_db_path;

pub fn run(db: Option<&str>) -> Result<()> {
    let conn = open_existing(&resolve_db_path(db))?;
    let batches = list_imports(&conn)?;

    if batches.is_empty() {
        println!("No imports yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Imported At", "File", "Type", "Inserted", "Hash"]);
    for b in batches {
        table.add_row(vec![
            Cell::new(b.id),
            Cell::new(b.imported_at),
            Cell::new(b.filename),
            Cell::new(b.source_type),
            Cell::new(b.inserted_count),
            Cell::new(short_hash(&b.hash)),
        ]);
    }
    println!("Imports\n{table}");
    Ok(())
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(12).collect()
}
