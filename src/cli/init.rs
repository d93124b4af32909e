use std::path::PathBuf;

use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(db: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(path) = db {
        settings.db_path = shellexpand_path(&path);
    }

    let db_path = PathBuf::from(&settings.db_path);
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let conn = get_connection(&db_path)?;
    let seeded = init_db(&conn)?;
    save_settings(&settings)?;

    if seeded > 0 {
        println!("{} Inserted {seeded} default categories", "[OK]".green());
    } else {
        println!("{} Categories already exist", "[SKIP]".yellow());
    }
    println!("{} Database ready at {}", "[OK]".green(), db_path.display());
    Ok(())
}
