// ==========================================
// Importer integration tests
// ==========================================
// End-to-end coverage of the import pipeline against a real temp
// database: legacy file import, resolution policies, partial failure
// isolation and cancellation.
// ==========================================

mod test_helpers;

use async_trait::async_trait;
use sigorta_crm::config::ConfigManager;
use sigorta_crm::domain::{
    CancelFlag, CsvFormat, ExistingCustomer, ImportBatch, ImportFormat, PolicyRecord,
    ResolutionPolicy, RowErrorKind,
};
use sigorta_crm::importer::{PolicyImporter, PolicyImporterImpl};
use sigorta_crm::logging;
use sigorta_crm::repository::error::{RepositoryError, RepositoryResult};
use sigorta_crm::repository::{PolicyImportRepository, PolicyImportRepositoryImpl};

fn create_test_importer(
    db_path: &str,
) -> PolicyImporterImpl<PolicyImportRepositoryImpl, ConfigManager> {
    let repo = PolicyImportRepositoryImpl::new(db_path).expect("Failed to create repo");
    let config = ConfigManager::new(db_path).expect("Failed to create config");
    PolicyImporterImpl::new(repo, config)
}

#[tokio::test]
async fn test_legacy_file_import_end_to_end() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    let lines = vec![
        test_helpers::legacy_header_line(),
        test_helpers::legacy_row(
            "ACC-1",
            "12345678901",
            "ŞÜKRÜ ÇAĞLAYAN",
            "POL-100",
            "12.845,00",
            "1.249,50",
        ),
        test_helpers::legacy_row("ACC-2", "98765432109", "AYŞE GÜL", "POL-101", "850,75", ""),
    ];
    let file = test_helpers::write_legacy_file(&lines);

    let importer = create_test_importer(&db_path);
    let outcome = importer
        .import_file(
            file.path(),
            ImportFormat::Csv(CsvFormat::SemicolonLegacy),
            ResolutionPolicy::SkipDuplicates,
            CancelFlag::new(),
        )
        .await
        .expect("import should succeed");

    assert_eq!(outcome.summary.total_rows, 2);
    assert_eq!(outcome.summary.created, 2);
    assert_eq!(outcome.summary.updated, 0);
    assert_eq!(outcome.summary.duplicates, 0);
    assert!(outcome.summary.errors.is_empty());

    let conn = rusqlite::Connection::open(&db_path).unwrap();

    // Turkish letters survived the windows-1254 round trip
    let name: String = conn
        .query_row(
            "SELECT customer_name FROM policy_record WHERE national_id = '12345678901'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "ŞÜKRÜ ÇAĞLAYAN");

    // Turkish decimal notation parsed with the comma as decimal separator
    let gross: f64 = conn
        .query_row(
            "SELECT gross_premium FROM policy_record WHERE national_id = '12345678901'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!((gross - 12_845.0).abs() < 1e-9);

    // empty net premium stays NULL instead of becoming zero
    let net: Option<f64> = conn
        .query_row(
            "SELECT net_premium FROM policy_record WHERE national_id = '98765432109'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(net, None);

    // batch audit row written
    let batches: i64 = conn
        .query_row("SELECT COUNT(*) FROM import_batch", [], |row| row.get(0))
        .unwrap();
    assert_eq!(batches, 1);
}

#[tokio::test]
async fn test_overwrite_policy_replaces_whole_record() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        test_helpers::insert_stored_policy(&conn, "ACC-OLD", "12345678901", "OLD NAME", "POL-OLD")
            .unwrap();
    }

    let importer = create_test_importer(&db_path);
    let records = vec![
        test_helpers::sample_record(1, "12345678901", "NEW NAME"),
        test_helpers::sample_record(2, "55555555555", "FRESH CUSTOMER"),
    ];

    let outcome = importer
        .import_rows(records, ResolutionPolicy::OverwriteAll, CancelFlag::new())
        .await
        .expect("import should succeed");

    assert_eq!(outcome.summary.created, 1);
    assert_eq!(outcome.summary.updated, 1);
    assert_eq!(outcome.summary.duplicates, 1);

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    assert_eq!(
        test_helpers::count_policies_by_national_id(&conn, "12345678901").unwrap(),
        1
    );
    let name: String = conn
        .query_row(
            "SELECT customer_name FROM policy_record WHERE national_id = '12345678901'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "NEW NAME");
}

#[tokio::test]
async fn test_skip_policy_keeps_existing_untouched() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        test_helpers::insert_stored_policy(&conn, "ACC-OLD", "12345678901", "OLD NAME", "POL-OLD")
            .unwrap();
    }

    let importer = create_test_importer(&db_path);
    let records = vec![
        test_helpers::sample_record(1, "12345678901", "NEW NAME"),
        test_helpers::sample_record(2, "55555555555", "FRESH CUSTOMER"),
    ];

    let outcome = importer
        .import_rows(records, ResolutionPolicy::SkipDuplicates, CancelFlag::new())
        .await
        .expect("import should succeed");

    assert_eq!(outcome.summary.created, 1);
    assert_eq!(outcome.summary.updated, 0);
    assert_eq!(outcome.summary.duplicates, 1);

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let name: String = conn
        .query_row(
            "SELECT customer_name FROM policy_record WHERE national_id = '12345678901'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "OLD NAME");
}

#[tokio::test]
async fn test_caller_rows_without_numbers_partition_independently() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        test_helpers::insert_stored_policy(&conn, "ACC-OLD", "12345678901", "STORED", "POL-OLD")
            .unwrap();
    }

    let importer = create_test_importer(&db_path);
    // both records carry the Default row number 0; only the first one
    // conflicts with the store
    let records = vec![
        PolicyRecord {
            national_id: Some("12345678901".to_string()),
            customer_name: Some("CONFLICTING".to_string()),
            ..Default::default()
        },
        PolicyRecord {
            national_id: Some("55555555555".to_string()),
            customer_name: Some("NOVEL CUSTOMER".to_string()),
            ..Default::default()
        },
    ];

    let outcome = importer
        .import_rows(records, ResolutionPolicy::SkipDuplicates, CancelFlag::new())
        .await
        .expect("import should succeed");

    // the novel customer must not be dragged down with the conflicting one
    assert_eq!(outcome.summary.created, 1);
    assert_eq!(outcome.summary.duplicates, 1);

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    assert_eq!(
        test_helpers::count_policies_by_national_id(&conn, "55555555555").unwrap(),
        1
    );
}

#[tokio::test]
async fn test_intra_batch_repeats_dropped_under_skip() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    let importer = create_test_importer(&db_path);
    let records = vec![
        test_helpers::sample_record(1, "12345678901", "FIRST OCCURRENCE"),
        test_helpers::sample_record(2, "12345678901", "SECOND OCCURRENCE"),
    ];

    let check = importer.check_duplicates(&records).await.unwrap();
    assert!(!check.has_duplicates);
    assert_eq!(check.intra_batch_duplicates.len(), 1);
    assert_eq!(check.intra_batch_duplicates[0].row_number, 2);
    assert_eq!(check.intra_batch_duplicates[0].first_row_number, 1);

    let outcome = importer
        .import_rows(records, ResolutionPolicy::SkipDuplicates, CancelFlag::new())
        .await
        .expect("import should succeed");

    assert_eq!(outcome.summary.created, 1);
    assert_eq!(outcome.summary.duplicates, 1);

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    assert_eq!(
        test_helpers::count_policies_by_national_id(&conn, "12345678901").unwrap(),
        1
    );
}

#[tokio::test]
async fn test_short_row_counted_as_error_not_fatal() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    let lines = vec![
        test_helpers::legacy_header_line(),
        test_helpers::legacy_row("ACC-1", "12345678901", "GOOD ROW", "POL-1", "100,00", "90,00"),
        // truncated row, not decodable without misalignment risk
        "ACC-2;98765432109;TRUNCATED ROW".to_string(),
    ];
    let file = test_helpers::write_legacy_file(&lines);

    let importer = create_test_importer(&db_path);
    let outcome = importer
        .import_file(
            file.path(),
            ImportFormat::Csv(CsvFormat::SemicolonLegacy),
            ResolutionPolicy::SkipDuplicates,
            CancelFlag::new(),
        )
        .await
        .expect("import should succeed despite the bad row");

    assert_eq!(outcome.summary.total_rows, 2);
    assert_eq!(outcome.summary.created, 1);
    assert_eq!(outcome.summary.errors.len(), 1);
    assert_eq!(outcome.summary.errors[0].kind, RowErrorKind::Decode);
    assert_eq!(outcome.summary.errors[0].first_row, 2);

    // the error report lands in the batch audit row
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let report: Option<String> = conn
        .query_row("SELECT error_report_json FROM import_batch", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert!(report.is_some());
}

// ==========================================
// Partial batch failure isolation
// ==========================================

/// Delegating repository that fails any insert chunk containing a
/// record with account code "FAIL".
struct FaultyRepo {
    inner: PolicyImportRepositoryImpl,
}

#[async_trait]
impl PolicyImportRepository for FaultyRepo {
    async fn insert_policies(&self, records: &[PolicyRecord]) -> RepositoryResult<usize> {
        if records
            .iter()
            .any(|r| r.account_code.as_deref() == Some("FAIL"))
        {
            return Err(RepositoryError::DatabaseTransactionError(
                "simulated chunk failure".to_string(),
            ));
        }
        self.inner.insert_policies(records).await
    }

    async fn overwrite_policies(
        &self,
        records: &[PolicyRecord],
    ) -> RepositoryResult<(usize, usize)> {
        self.inner.overwrite_policies(records).await
    }

    async fn find_customers_by_national_ids(
        &self,
        national_ids: &[String],
    ) -> RepositoryResult<Vec<ExistingCustomer>> {
        self.inner.find_customers_by_national_ids(national_ids).await
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.inner.insert_import_batch(batch).await
    }
}

#[tokio::test]
async fn test_failed_chunk_does_not_abort_later_chunks() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    let config = ConfigManager::new(&db_path).expect("Failed to create config");
    config
        .set_config_value("import/batch_size", "2")
        .expect("Failed to set batch size");

    let repo = FaultyRepo {
        inner: PolicyImportRepositoryImpl::new(&db_path).expect("Failed to create repo"),
    };
    let importer = PolicyImporterImpl::new(repo, config);

    // chunk 1: rows 1-2, chunk 2: rows 3-4 (poisoned), chunk 3: rows 5-6
    let mut records: Vec<PolicyRecord> = (1..=6)
        .map(|i| test_helpers::sample_record(i, &format!("1000000000{}", i), "CUSTOMER"))
        .collect();
    records[2].account_code = Some("FAIL".to_string());

    let outcome = importer
        .import_rows(records, ResolutionPolicy::SkipDuplicates, CancelFlag::new())
        .await
        .expect("import should survive one failed chunk");

    assert_eq!(outcome.summary.created, 4);
    assert_eq!(outcome.summary.errors.len(), 1);
    assert_eq!(outcome.summary.errors[0].kind, RowErrorKind::Persist);
    assert_eq!(outcome.summary.errors[0].first_row, 3);
    assert_eq!(outcome.summary.errors[0].last_row, 4);
    assert_eq!(outcome.summary.errors[0].row_count, 2);

    // rows from the chunks before and after the failed one persisted
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM policy_record", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 4);
}

#[tokio::test]
async fn test_persist_error_count_excludes_decode_failed_rows() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    let config = ConfigManager::new(&db_path).expect("Failed to create config");
    config
        .set_config_value("import/batch_size", "2")
        .expect("Failed to set batch size");

    let repo = FaultyRepo {
        inner: PolicyImportRepositoryImpl::new(&db_path).expect("Failed to create repo"),
    };
    let importer = PolicyImporterImpl::new(repo, config);

    // row 2 fails decoding, so the surviving rows 1,3,4,5 chunk as
    // [1,3] (poisoned) and [4,5]; the failed chunk's range spans the
    // decode-failed row 2 without holding it
    let lines = vec![
        test_helpers::legacy_header_line(),
        test_helpers::legacy_row("ACC-1", "10000000001", "GOOD", "POL-1", "100,00", "90,00"),
        "ACC-X;10000000002;KISA SATIR".to_string(),
        test_helpers::legacy_row("FAIL", "10000000003", "POISON", "POL-3", "100,00", "90,00"),
        test_helpers::legacy_row("ACC-4", "10000000004", "GOOD", "POL-4", "100,00", "90,00"),
        test_helpers::legacy_row("ACC-5", "10000000005", "GOOD", "POL-5", "100,00", "90,00"),
    ];
    let file = test_helpers::write_legacy_file(&lines);

    let outcome = importer
        .import_file(
            file.path(),
            ImportFormat::Csv(CsvFormat::SemicolonLegacy),
            ResolutionPolicy::SkipDuplicates,
            CancelFlag::new(),
        )
        .await
        .expect("import should survive one failed chunk");

    assert_eq!(outcome.summary.total_rows, 5);
    assert_eq!(outcome.summary.created, 2);

    let persist = outcome
        .summary
        .errors
        .iter()
        .find(|e| e.kind == RowErrorKind::Persist)
        .expect("persist error recorded");
    assert_eq!((persist.first_row, persist.last_row), (1, 3));
    assert_eq!(persist.row_count, 2);

    // row 2 is billed once as a decode error, not again inside the range
    assert_eq!(outcome.summary.error_rows(), 3);
    assert_eq!(outcome.batch.error_rows, 3);
}

#[tokio::test]
async fn test_cancellation_at_batch_boundary() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    let importer = create_test_importer(&db_path);
    let records = vec![
        test_helpers::sample_record(1, "11111111111", "A"),
        test_helpers::sample_record(2, "22222222222", "B"),
    ];

    let cancel = CancelFlag::new();
    cancel.cancel();

    let outcome = importer
        .import_rows(records, ResolutionPolicy::SkipDuplicates, cancel)
        .await
        .expect("cancelled import still reports an outcome");

    assert!(outcome.summary.cancelled);
    assert_eq!(outcome.summary.created, 0);
    assert_eq!(outcome.summary.errors.len(), 1);
    assert_eq!(outcome.summary.errors[0].kind, RowErrorKind::Cancelled);
    assert_eq!(outcome.summary.errors[0].row_count, 2);

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM policy_record", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_cancellation_reports_pending_overwrite_rows() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        test_helpers::insert_stored_policy(&conn, "ACC-OLD", "12345678901", "STORED", "POL-OLD")
            .unwrap();
    }

    let importer = create_test_importer(&db_path);
    let records = vec![
        test_helpers::sample_record(1, "12345678901", "CONFLICTING"), // overwrite phase
        test_helpers::sample_record(2, "55555555555", "NOVEL"),       // insert phase
    ];

    let cancel = CancelFlag::new();
    cancel.cancel();

    let outcome = importer
        .import_rows(records, ResolutionPolicy::OverwriteAll, cancel)
        .await
        .expect("cancelled import still reports an outcome");

    assert!(outcome.summary.cancelled);
    assert_eq!(outcome.summary.created, 0);
    assert_eq!(outcome.summary.updated, 0);

    // the never-started overwrite phase is reported, not silently dropped
    let cancelled_entries: Vec<_> = outcome
        .summary
        .errors
        .iter()
        .filter(|e| e.kind == RowErrorKind::Cancelled)
        .collect();
    assert_eq!(cancelled_entries.len(), 2);
    assert_eq!(outcome.summary.error_rows(), 2);
}
