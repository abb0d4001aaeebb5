// ==========================================
// Test helpers
// ==========================================
// Temp database setup and legacy export fixtures shared by the
// integration tests.
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use sigorta_crm::db;
use sigorta_crm::domain::PolicyRecord;
use sigorta_crm::importer::field_mapper::COLUMN_TABLE;
use std::error::Error;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// Create a temp database with the full schema applied.
///
/// Returns the temp file (keep it alive for the test duration) and its
/// path.
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    db::configure_sqlite_connection(&conn)?;
    db::ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// The legacy export header line, semicolon separated.
pub fn legacy_header_line() -> String {
    COLUMN_TABLE
        .iter()
        .map(|spec| spec.header)
        .collect::<Vec<_>>()
        .join(";")
}

/// Build one semicolon row of the legacy export with the usual shape:
/// dates as DD-MM-YY, decimals with Turkish separators, everything else
/// empty.
pub fn legacy_row(
    account_code: &str,
    national_id: &str,
    name: &str,
    policy_no: &str,
    gross: &str,
    net: &str,
) -> String {
    let mut cells = vec![String::new(); COLUMN_TABLE.len()];
    cells[0] = account_code.to_string(); // HESAP KODU
    cells[1] = national_id.to_string(); // TC KIMLIK NO
    cells[2] = name.to_string(); // ADI SOYADI
    cells[13] = policy_no.to_string(); // POLICE NO
    cells[23] = "15-03-23".to_string(); // TANZIM TARIHI
    cells[24] = "20-03-23".to_string(); // BASLANGIC TARIHI
    cells[25] = "20-03-24".to_string(); // BITIS TARIHI
    cells[26] = gross.to_string(); // BRUT PRIM
    cells[27] = net.to_string(); // NET PRIM
    cells.join(";")
}

/// Write a legacy export file: windows-1254 bytes, .csv suffix.
pub fn write_legacy_file(lines: &[String]) -> NamedTempFile {
    let content = lines.join("\r\n");
    let (encoded, _, _) = encoding_rs::WINDOWS_1254.encode(&content);

    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(&encoded).unwrap();
    file.flush().unwrap();
    file
}

/// Minimal in-memory record for the row-based import path.
pub fn sample_record(row_number: usize, national_id: &str, name: &str) -> PolicyRecord {
    PolicyRecord {
        row_number,
        account_code: Some(format!("ACC-{}", row_number)),
        national_id: Some(national_id.to_string()),
        customer_name: Some(name.to_string()),
        policy_no: Some(format!("POL-{}", row_number)),
        gross_premium: Some(1_312.5),
        net_premium: Some(1_249.5),
        ..Default::default()
    }
}

/// Insert a stored policy record directly, bypassing the importer.
pub fn insert_stored_policy(
    conn: &Connection,
    account_code: &str,
    national_id: &str,
    name: &str,
    policy_no: &str,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO policy_record
             (account_code, national_id, customer_name, policy_no, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'), datetime('now'))",
        rusqlite::params![account_code, national_id, name, policy_no],
    )?;
    Ok(())
}

/// Count stored policy records for one national ID.
pub fn count_policies_by_national_id(
    conn: &Connection,
    national_id: &str,
) -> Result<i64, Box<dyn Error>> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM policy_record WHERE national_id = ?1",
        [national_id],
        |row| row.get(0),
    )?;
    Ok(n)
}
