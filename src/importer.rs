use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::db::open_existing;
use crate::error::Result;
use crate::models::{LedgerTarget, Statement, TransactionRecord};
use crate::ofx;

pub const ORIGIN_OFX: &str = "ofx";
pub const SOURCE_TYPE_OFX: &str = "ofx";
pub const STATUS_SETTLED: &str = "settled";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn file_base_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn fitid_exists(conn: &Connection, fitid: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM transactions WHERE fitid = ?1")?;
    Ok(stmt.exists([fitid])?)
}

// ---------------------------------------------------------------------------
// import_statement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub inserted: usize,
    pub skipped: usize,
}

/// Inserts every record whose FITID is not already in the ledger and logs one
/// import batch. Everything happens in one transaction: on error nothing is
/// committed.
pub fn import_statement(
    conn: &mut Connection,
    records: &[TransactionRecord],
    target: LedgerTarget,
    file_name: &str,
    file_hash: &str,
) -> Result<ImportResult> {
    let tx = conn.transaction()?;
    let mut result = ImportResult::default();

    for record in records {
        // Empty FITIDs cannot be deduplicated; they are always inserted.
        if !record.external_id.is_empty() && fitid_exists(&tx, &record.external_id)? {
            tracing::debug!(fitid = %record.external_id, "duplicate FITID, skipping");
            result.skipped += 1;
            continue;
        }

        let kind = record.kind();
        tx.execute(
            "INSERT INTO transactions (account_id, card_id, date, description, original_description, \
             amount, kind, origin, source_file, fitid, raw_type, status) \
             VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                target.account_id,
                target.card_id,
                record.posted_date,
                record.description,
                record.amount,
                kind.as_str(),
                ORIGIN_OFX,
                file_name,
                record.external_id,
                record.raw_type,
                STATUS_SETTLED,
            ],
        )?;
        tracing::debug!(
            fitid = %record.external_id,
            date = %record.posted_date,
            amount = record.amount,
            kind = kind.as_str(),
            check_number = ?record.check_number,
            "inserted transaction"
        );
        result.inserted += 1;
    }

    tx.execute(
        "INSERT INTO imports (filename, source_type, hash, inserted_count) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![file_name, SOURCE_TYPE_OFX, file_hash, result.inserted as i64],
    )?;
    tx.commit()?;

    tracing::info!(
        file = file_name,
        inserted = result.inserted,
        skipped = result.skipped,
        "import committed"
    );
    Ok(result)
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

/// A statement file read and parsed, not yet written anywhere.
pub struct StatementFile {
    pub name: String,
    pub hash: String,
    pub statement: Statement,
}

pub fn read_statement(file_path: &Path) -> Result<StatementFile> {
    let data = std::fs::read(file_path)?;
    let statement = ofx::parse(&data)?;
    Ok(StatementFile {
        name: file_base_name(file_path),
        hash: compute_checksum(&data),
        statement,
    })
}

/// Writes a parsed file into the ledger. Returns `None` without opening the
/// store when the file held no transactions.
pub fn import_file(
    db_path: &Path,
    file: &StatementFile,
    target: LedgerTarget,
) -> Result<Option<ImportResult>> {
    if file.statement.transactions.is_empty() {
        return Ok(None);
    }
    let mut conn = open_existing(db_path)?;
    let result = import_statement(
        &mut conn,
        &file.statement.transactions,
        target,
        &file.name,
        &file.hash,
    )?;
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db, list_imports};
    use crate::ofx::NO_DESCRIPTION;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn record(fitid: &str, amount: f64) -> TransactionRecord {
        TransactionRecord {
            external_id: fitid.to_string(),
            posted_date: "2024-03-15".to_string(),
            amount,
            description: format!("TXN {fitid}"),
            raw_type: "OTHER".to_string(),
            check_number: None,
        }
    }

    fn write_ofx(dir: &Path, name: &str, rows: &[(&str, &str, &str)]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut content = String::from("OFXHEADER:100\nDATA:OFXSGML\n\n<OFX>\n<ACCTID>98765\n<BANKTRANLIST>\n");
        for (date, amount, fitid) in rows {
            content.push_str(&format!(
                "<STMTTRN>\n<TRNTYPE>OTHER\n<DTPOSTED>{date}\n<TRNAMT>{amount}\n<FITID>{fitid}\n<MEMO>Row {fitid}\n</STMTTRN>\n"
            ));
        }
        content.push_str("</BANKTRANLIST>\n</OFX>\n");
        std::fs::write(&path, &content).unwrap();
        path
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn test_compute_checksum() {
        assert_eq!(
            compute_checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_import_statement_inserts_rows() {
        let (_dir, mut conn) = test_db();
        let records = vec![record("F1", -10.0), record("F2", 25.5)];
        let result = import_statement(&mut conn, &records, LedgerTarget::default(), "stmt.ofx", "h").unwrap();
        assert_eq!(result, ImportResult { inserted: 2, skipped: 0 });
        assert_eq!(count(&conn, "transactions"), 2);
    }

    #[test]
    fn test_import_statement_row_contents() {
        let (_dir, mut conn) = test_db();
        conn.execute("INSERT INTO accounts (id, name) VALUES (7, 'Checking')", []).unwrap();
        conn.execute("INSERT INTO cards (id, name) VALUES (3, 'Visa')", []).unwrap();
        let mut rec = record("F1", 100.0);
        rec.raw_type = "CREDIT".to_string();
        let target = LedgerTarget { account_id: Some(7), card_id: Some(3) };
        import_statement(&mut conn, &[rec], target, "stmt.ofx", "h").unwrap();

        let row: (i64, i64, String, String, String, f64, String, String, String, String, String, String) = conn
            .query_row(
                "SELECT account_id, card_id, date, description, original_description, amount, kind, \
                 origin, source_file, fitid, raw_type, status FROM transactions",
                [],
                |r| {
                    Ok((
                        r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?,
                        r.get(6)?, r.get(7)?, r.get(8)?, r.get(9)?, r.get(10)?, r.get(11)?,
                    ))
                },
            )
            .unwrap();
        assert_eq!(row.0, 7);
        assert_eq!(row.1, 3);
        assert_eq!(row.2, "2024-03-15");
        assert_eq!(row.3, "TXN F1");
        assert_eq!(row.4, "TXN F1");
        assert_eq!(row.5, 100.0);
        assert_eq!(row.6, "credit");
        assert_eq!(row.7, "ofx");
        assert_eq!(row.8, "stmt.ofx");
        assert_eq!(row.9, "F1");
        assert_eq!(row.10, "CREDIT");
        assert_eq!(row.11, "settled");
    }

    #[test]
    fn test_classification_by_sign() {
        let (_dir, mut conn) = test_db();
        let records = vec![record("C", 100.0), record("D", -50.0), record("Z", 0.0)];
        import_statement(&mut conn, &records, LedgerTarget::default(), "stmt.ofx", "h").unwrap();
        let kind = |fitid: &str| -> String {
            conn.query_row("SELECT kind FROM transactions WHERE fitid = ?1", [fitid], |r| r.get(0))
                .unwrap()
        };
        assert_eq!(kind("C"), "credit");
        assert_eq!(kind("D"), "debit");
        assert_eq!(kind("Z"), "debit");
    }

    #[test]
    fn test_reimport_skips_known_fitids() {
        let (_dir, mut conn) = test_db();
        let records = vec![record("F1", -1.0), record("F2", -2.0), record("F3", 3.0)];
        let first = import_statement(&mut conn, &records, LedgerTarget::default(), "a.ofx", "h").unwrap();
        assert_eq!(first, ImportResult { inserted: 3, skipped: 0 });
        let second = import_statement(&mut conn, &records, LedgerTarget::default(), "a.ofx", "h").unwrap();
        assert_eq!(second, ImportResult { inserted: 0, skipped: 3 });
        assert_eq!(count(&conn, "transactions"), 3);
    }

    #[test]
    fn test_existing_row_is_not_updated() {
        let (_dir, mut conn) = test_db();
        import_statement(&mut conn, &[record("F1", -1.0)], LedgerTarget::default(), "a.ofx", "h").unwrap();
        let mut changed = record("F1", -99.0);
        changed.description = "Changed".to_string();
        import_statement(&mut conn, &[changed], LedgerTarget::default(), "b.ofx", "h").unwrap();
        let (amount, desc): (f64, String) = conn
            .query_row("SELECT amount, description FROM transactions WHERE fitid = 'F1'", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(amount, -1.0);
        assert_eq!(desc, "TXN F1");
    }

    #[test]
    fn test_overlapping_statements() {
        let (_dir, mut conn) = test_db();
        import_statement(&mut conn, &[record("F1", -1.0), record("F2", -2.0)], LedgerTarget::default(), "jan.ofx", "h1").unwrap();
        let result = import_statement(&mut conn, &[record("F2", -2.0), record("F3", -3.0)], LedgerTarget::default(), "feb.ofx", "h2").unwrap();
        assert_eq!(result, ImportResult { inserted: 1, skipped: 1 });
    }

    #[test]
    fn test_repeated_fitid_within_one_run() {
        let (_dir, mut conn) = test_db();
        let records = vec![record("F1", -1.0), record("F1", -1.0)];
        let result = import_statement(&mut conn, &records, LedgerTarget::default(), "a.ofx", "h").unwrap();
        assert_eq!(result, ImportResult { inserted: 1, skipped: 1 });
    }

    #[test]
    fn test_empty_fitids_are_never_deduplicated() {
        let (_dir, mut conn) = test_db();
        let records = vec![record("", -1.0), record("", -1.0)];
        let first = import_statement(&mut conn, &records, LedgerTarget::default(), "a.ofx", "h").unwrap();
        let second = import_statement(&mut conn, &records, LedgerTarget::default(), "a.ofx", "h").unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(second.inserted, 2);
        assert_eq!(count(&conn, "transactions"), 4);
    }

    #[test]
    fn test_batch_logged_once_even_with_zero_inserts() {
        let (_dir, mut conn) = test_db();
        let records = vec![record("F1", -1.0)];
        import_statement(&mut conn, &records, LedgerTarget::default(), "a.ofx", "hash1").unwrap();
        import_statement(&mut conn, &records, LedgerTarget::default(), "a.ofx", "hash1").unwrap();
        let batches = list_imports(&conn).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].inserted_count, 1);
        assert_eq!(batches[1].inserted_count, 0);
        assert_eq!(batches[1].filename, "a.ofx");
        assert_eq!(batches[1].source_type, "ofx");
        assert_eq!(batches[1].hash, "hash1");
    }

    #[test]
    fn test_failure_rolls_back_everything() {
        let (_dir, mut conn) = test_db();
        // Foreign keys are on and account 42 does not exist.
        let target = LedgerTarget { account_id: Some(42), card_id: None };
        let err = import_statement(&mut conn, &[record("F1", -1.0)], target, "a.ofx", "h");
        assert!(err.is_err());
        assert_eq!(count(&conn, "transactions"), 0);
        assert_eq!(count(&conn, "imports"), 0);
    }

    #[test]
    fn test_import_file_end_to_end() {
        let (dir, conn) = test_db();
        drop(conn);
        let db_path = dir.path().join("test.db");
        let ofx_path = write_ofx(dir.path(), "extrato.ofx", &[
            ("20240301", "-10,00", "A1"),
            ("20240302120000", "250.00", "A2"),
        ]);

        let file = read_statement(&ofx_path).unwrap();
        assert_eq!(file.name, "extrato.ofx");
        assert_eq!(file.statement.transactions.len(), 2);
        assert_eq!(file.statement.account_id.as_deref(), Some("98765"));
        assert_eq!(file.hash, compute_checksum(&std::fs::read(&ofx_path).unwrap()));

        let first = import_file(&db_path, &file, LedgerTarget::default()).unwrap();
        assert_eq!(first, Some(ImportResult { inserted: 2, skipped: 0 }));
        let second = import_file(&db_path, &file, LedgerTarget::default()).unwrap();
        assert_eq!(second, Some(ImportResult { inserted: 0, skipped: 2 }));

        let conn = open_existing(&db_path).unwrap();
        let batches = list_imports(&conn).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].filename, "extrato.ofx");
        assert_eq!(batches[0].hash, file.hash);
    }

    #[test]
    fn test_read_statement_does_not_need_a_store() {
        let dir = tempfile::tempdir().unwrap();
        let ofx_path = write_ofx(dir.path(), "fatura.ofx", &[("20240301", "-1.00", "A1")]);
        let file = read_statement(&ofx_path).unwrap();
        assert_eq!(file.statement.transactions.len(), 1);

        // The store is only touched by import_file, after the file was read.
        let err = import_file(&dir.path().join("missing.db"), &file, LedgerTarget::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_import_file_without_transactions_skips_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("never-created.db");
        let ofx_path = write_ofx(dir.path(), "empty.ofx", &[]);
        let file = read_statement(&ofx_path).unwrap();
        assert!(file.statement.transactions.is_empty());
        assert_eq!(import_file(&db_path, &file, LedgerTarget::default()).unwrap(), None);
        assert!(!db_path.exists());
    }

    #[test]
    fn test_bad_amount_fails_before_store_is_touched() {
        let (dir, conn) = test_db();
        let ofx_path = write_ofx(dir.path(), "bad.ofx", &[
            ("20240301", "-10.00", "A1"),
            ("20240302", "ten", "A2"),
        ]);
        assert!(read_statement(&ofx_path).is_err());
        assert_eq!(count(&conn, "transactions"), 0);
        assert_eq!(count(&conn, "imports"), 0);
    }

    #[test]
    fn test_import_into_existing_account_and_card() {
        let (_dir, mut conn) = test_db();
        conn.execute("INSERT INTO accounts (name) VALUES ('Checking')", []).unwrap();
        conn.execute("INSERT INTO cards (name) VALUES ('Visa')", []).unwrap();
        let account = LedgerTarget { account_id: Some(1), card_id: None };
        let card = LedgerTarget { account_id: None, card_id: Some(1) };
        import_statement(&mut conn, &[record("F1", -1.0)], account, "a.ofx", "h").unwrap();
        import_statement(&mut conn, &[record("F2", -2.0)], card, "b.ofx", "h").unwrap();
        let refs: Vec<(Option<i64>, Option<i64>)> = conn
            .prepare("SELECT account_id, card_id FROM transactions ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(refs, vec![(Some(1), None), (None, Some(1))]);
    }

    #[test]
    fn test_placeholder_description_is_stored() {
        let (_dir, mut conn) = test_db();
        let mut rec = record("F1", -1.0);
        rec.description = NO_DESCRIPTION.to_string();
        import_statement(&mut conn, &[rec], LedgerTarget::default(), "a.ofx", "h").unwrap();
        let desc: String = conn.query_row("SELECT description FROM transactions", [], |r| r.get(0)).unwrap();
        assert_eq!(desc, NO_DESCRIPTION);
    }
}
