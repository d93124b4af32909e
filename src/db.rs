use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{OfxloadError, Result};
use crate::models::{ImportBatch, Ledger, LedgerKind};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    institution TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    institution TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category_group TEXT NOT NULL,
    category_type TEXT NOT NULL,
    is_active INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER,
    card_id INTEGER,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    original_description TEXT NOT NULL,
    amount REAL NOT NULL,
    kind TEXT NOT NULL,
    origin TEXT NOT NULL,
    source_file TEXT,
    fitid TEXT,
    raw_type TEXT,
    status TEXT NOT NULL,
    category_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (card_id) REFERENCES cards(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_fitid ON transactions(fitid);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    source_type TEXT NOT NULL,
    hash TEXT NOT NULL,
    inserted_count INTEGER NOT NULL,
    imported_at TEXT DEFAULT (datetime('now'))
);
";

// (name, category_group, category_type)
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    // Housing
    ("Rent / Mortgage", "Housing", "expense"),
    ("Condo Fees", "Housing", "expense"),
    ("Property Tax", "Housing", "expense"),
    ("Electricity", "Housing", "expense"),
    ("Water", "Housing", "expense"),
    ("Gas", "Housing", "expense"),
    ("Internet", "Housing", "expense"),
    ("Home Maintenance", "Housing", "expense"),
    // Transportation
    ("Fuel", "Transportation", "expense"),
    ("Vehicle Loan", "Transportation", "expense"),
    ("Vehicle Insurance", "Transportation", "expense"),
    ("Vehicle Tax / Registration", "Transportation", "expense"),
    ("Parking / Tolls", "Transportation", "expense"),
    ("Public Transit", "Transportation", "expense"),
    ("Vehicle Maintenance", "Transportation", "expense"),
    ("Ride Hailing", "Transportation", "expense"),
    // Food
    ("Groceries", "Food", "expense"),
    ("Restaurants / Delivery", "Food", "expense"),
    ("Bakery / Coffee", "Food", "expense"),
    ("Snacks", "Food", "expense"),
    // Health
    ("Health Insurance", "Health", "expense"),
    ("Pharmacy", "Health", "expense"),
    ("Doctor Visits", "Health", "expense"),
    ("Lab Tests", "Health", "expense"),
    ("Dental", "Health", "expense"),
    // Education
    ("School / University", "Education", "expense"),
    ("Courses / Books", "Education", "expense"),
    ("School Supplies", "Education", "expense"),
    // Leisure
    ("Entertainment", "Leisure", "expense"),
    ("Travel", "Leisure", "expense"),
    ("Streaming", "Leisure", "expense"),
    ("Hobbies", "Leisure", "expense"),
    // Personal
    ("Clothing", "Personal", "expense"),
    ("Beauty / Grooming", "Personal", "expense"),
    ("Gym", "Personal", "expense"),
    ("Gifts", "Personal", "expense"),
    // Financial
    ("Bank Fees", "Financial", "expense"),
    ("Interest / Penalties", "Financial", "expense"),
    ("Transaction Taxes", "Financial", "expense"),
    ("Insurance", "Financial", "expense"),
    ("Private Pension", "Financial", "expense"),
    // Shopping
    ("Electronics", "Shopping", "expense"),
    ("Home / Decor", "Shopping", "expense"),
    ("Marketplace", "Shopping", "expense"),
    // Family
    ("Allowance / Child Support", "Family", "expense"),
    ("Pets / Vet", "Family", "expense"),
    // Work
    ("Tools / Software", "Work", "expense"),
    ("Equipment", "Work", "expense"),
    // Giving
    ("Tithe", "Giving", "expense"),
    ("Offerings", "Giving", "expense"),
    ("Donations", "Giving", "expense"),
    // Other
    ("Uncategorized", "Other", "expense"),
    // Income
    ("Salary", "Income", "income"),
    ("Invoices", "Income", "income"),
    ("Freelance", "Income", "income"),
    ("Bonus / Profit Sharing", "Income", "income"),
    ("Investment Returns", "Income", "income"),
    ("Dividends", "Income", "income"),
    ("Rental Income", "Income", "income"),
    ("Reimbursements", "Income", "income"),
    ("Cashback", "Income", "income"),
    ("Credit Received", "Income", "income"),
];

/// Opens (creating if needed) a database for setup.
pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Opens an already-initialized database. Never creates the file.
pub fn open_existing(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(OfxloadError::Other(format!(
            "No database found at {}\nRun `ofxload init --db {}` to create one.",
            db_path.display(),
            db_path.display()
        )));
    }
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Creates missing tables and seeds categories on first run.
/// Returns how many categories were seeded (0 when already populated).
pub fn init_db(conn: &Connection) -> Result<usize> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(0);
    }
    for cat in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT INTO categories (name, category_group, category_type) VALUES (?1, ?2, ?3)",
            rusqlite::params![cat.0, cat.1, cat.2],
        )?;
    }
    Ok(DEFAULT_CATEGORIES.len())
}

pub fn add_ledger(conn: &Connection, kind: LedgerKind, name: &str, institution: Option<&str>) -> Result<i64> {
    conn.execute(
        &format!("INSERT INTO {} (name, institution) VALUES (?1, ?2)", kind.table()),
        rusqlite::params![name, institution],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_ledgers(conn: &Connection, kind: LedgerKind) -> Result<Vec<Ledger>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, institution FROM {} ORDER BY id",
        kind.table()
    ))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Ledger {
                id: row.get(0)?,
                name: row.get(1)?,
                institution: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_imports(conn: &Connection) -> Result<Vec<ImportBatch>> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, source_type, hash, inserted_count, imported_at \
         FROM imports ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ImportBatch {
                id: row.get(0)?,
                filename: row.get(1)?,
                source_type: row.get(2)?,
                hash: row.get(3)?,
                inserted_count: row.get(4)?,
                imported_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
