// ==========================================
// Sigorta CRM - SQLite connection setup
// ==========================================
// Every Connection::open in the crate goes through here so PRAGMA
// behavior and busy_timeout stay uniform across modules. Connection
// level PRAGMAs do not persist in the database file, so each new
// connection must re-apply them.
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout in milliseconds.
///
/// SQLite allows a single writer at a time; the importer and the
/// correction tool may both hold write transactions, so waiting out a
/// short lock beats surfacing a spurious busy error.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version this build expects. Bumped whenever `ensure_schema`
/// changes a table shape.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the uniform per-connection PRAGMAs.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the uniform configuration applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read the recorded schema version, `None` if the table does not exist yet.
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create all tables and indexes if missing and record the schema version.
///
/// Idempotent: safe to call on every startup. All policy columns are
/// nullable on purpose: the legacy exports leave arbitrary fields empty
/// and absence must survive the round trip unchanged.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id    TEXT PRIMARY KEY,
            scope_name  TEXT NOT NULL
        );
        INSERT OR IGNORE INTO config_scope (scope_id, scope_name)
            VALUES ('global', 'Global defaults');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id    TEXT NOT NULL REFERENCES config_scope(scope_id),
            key         TEXT NOT NULL,
            value       TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS policy_record (
            record_id          INTEGER PRIMARY KEY AUTOINCREMENT,
            account_code       TEXT,
            national_id        TEXT,
            customer_name      TEXT,
            customer_type      TEXT,
            birth_date         TEXT,
            occupation         TEXT,
            phone              TEXT,
            mobile_phone       TEXT,
            email              TEXT,
            address            TEXT,
            city               TEXT,
            district           TEXT,
            kvkk_consent       TEXT,
            policy_no          TEXT,
            renewal_no         INTEGER,
            endorsement_no     INTEGER,
            agency_code        TEXT,
            company_code       TEXT,
            company_name       TEXT,
            main_branch        TEXT,
            sub_branch         TEXT,
            product_code       TEXT,
            product_name       TEXT,
            issue_date         TEXT,
            start_date         TEXT,
            end_date           TEXT,
            gross_premium      REAL,
            net_premium        REAL,
            commission         REAL,
            currency           TEXT,
            installment_count  INTEGER,
            plate_no           TEXT,
            vehicle_brand      TEXT,
            vehicle_model      TEXT,
            vehicle_model_year INTEGER,
            chassis_no         TEXT,
            engine_no          TEXT,
            created_at         TEXT NOT NULL,
            updated_at         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_policy_record_national_id
            ON policy_record(national_id);
        CREATE INDEX IF NOT EXISTS idx_policy_record_account_code
            ON policy_record(account_code);

        CREATE TABLE IF NOT EXISTS customer_profile (
            account_code        TEXT PRIMARY KEY,
            national_id         TEXT,
            customer_name       TEXT,
            policy_count        INTEGER NOT NULL DEFAULT 0,
            total_gross_premium REAL NOT NULL DEFAULT 0,
            total_net_premium   REAL NOT NULL DEFAULT 0,
            products_json       TEXT NOT NULL DEFAULT '[]',
            plates_json         TEXT NOT NULL DEFAULT '[]',
            first_policy_date   TEXT,
            last_policy_date    TEXT,
            ai_tags             TEXT,
            updated_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id          TEXT PRIMARY KEY,
            file_name         TEXT,
            resolution_policy TEXT NOT NULL,
            total_rows        INTEGER NOT NULL,
            created_rows      INTEGER NOT NULL,
            updated_rows      INTEGER NOT NULL,
            duplicate_rows    INTEGER NOT NULL,
            error_rows        INTEGER NOT NULL,
            imported_at       TEXT NOT NULL,
            elapsed_ms        INTEGER NOT NULL,
            error_report_json TEXT
        );

        CREATE TABLE IF NOT EXISTS premium_correction_log (
            log_id        INTEGER PRIMARY KEY AUTOINCREMENT,
            record_id     INTEGER NOT NULL REFERENCES policy_record(record_id),
            old_gross     REAL NOT NULL,
            new_gross     REAL NOT NULL,
            net_premium   REAL,
            ratio         REAL,
            corrected_at  TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
