// ==========================================
// Sigorta CRM - policy import repository (rusqlite)
// ==========================================
// Wide nullable policy_record table per the field mapper target list.
// Each public call is one transaction; chunking across calls is the
// orchestrator's concern.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{ExistingCustomer, ImportBatch, PolicyRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::policy_import_repo::PolicyImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Upper bound on `IN (...)` placeholders per query.
const MAX_IN_PARAMS: usize = 500;

const INSERT_POLICY_SQL: &str = r#"
    INSERT INTO policy_record (
        account_code, national_id, customer_name, customer_type,
        birth_date, occupation, phone, mobile_phone, email, address,
        city, district, kvkk_consent, policy_no, renewal_no,
        endorsement_no, agency_code, company_code, company_name,
        main_branch, sub_branch, product_code, product_name,
        issue_date, start_date, end_date, gross_premium, net_premium,
        commission, currency, installment_count, plate_no,
        vehicle_brand, vehicle_model, vehicle_model_year, chassis_no,
        engine_no, created_at, updated_at
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
        ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
        ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
        ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38, ?39
    )
"#;

const OVERWRITE_POLICY_SQL: &str = r#"
    UPDATE policy_record SET
        account_code = ?1, customer_name = ?2, customer_type = ?3,
        birth_date = ?4, occupation = ?5, phone = ?6, mobile_phone = ?7,
        email = ?8, address = ?9, city = ?10, district = ?11,
        kvkk_consent = ?12, policy_no = ?13, renewal_no = ?14,
        endorsement_no = ?15, agency_code = ?16, company_code = ?17,
        company_name = ?18, main_branch = ?19, sub_branch = ?20,
        product_code = ?21, product_name = ?22, issue_date = ?23,
        start_date = ?24, end_date = ?25, gross_premium = ?26,
        net_premium = ?27, commission = ?28, currency = ?29,
        installment_count = ?30, plate_no = ?31, vehicle_brand = ?32,
        vehicle_model = ?33, vehicle_model_year = ?34, chassis_no = ?35,
        engine_no = ?36, updated_at = ?37
    WHERE national_id = ?38
"#;

pub struct PolicyImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl PolicyImportRepositoryImpl {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn insert_record_tx(
        tx: &Transaction,
        record: &PolicyRecord,
        now: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut stmt = tx.prepare_cached(INSERT_POLICY_SQL)?;
        stmt.execute(params![
            record.account_code,
            record.national_id,
            record.customer_name,
            record.customer_type,
            record.birth_date,
            record.occupation,
            record.phone,
            record.mobile_phone,
            record.email,
            record.address,
            record.city,
            record.district,
            record.kvkk_consent,
            record.policy_no,
            record.renewal_no,
            record.endorsement_no,
            record.agency_code,
            record.company_code,
            record.company_name,
            record.main_branch,
            record.sub_branch,
            record.product_code,
            record.product_name,
            record.issue_date,
            record.start_date,
            record.end_date,
            record.gross_premium,
            record.net_premium,
            record.commission,
            record.currency,
            record.installment_count,
            record.plate_no,
            record.vehicle_brand,
            record.vehicle_model,
            record.vehicle_model_year,
            record.chassis_no,
            record.engine_no,
            now,
            now,
        ])?;
        Ok(())
    }

    /// Whole-record replacement keyed by national ID. Returns the number of
    /// existing rows replaced (0 means the ID vanished since the check).
    fn overwrite_record_tx(
        tx: &Transaction,
        record: &PolicyRecord,
        national_id: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare_cached(OVERWRITE_POLICY_SQL)?;
        let affected = stmt.execute(params![
            record.account_code,
            record.customer_name,
            record.customer_type,
            record.birth_date,
            record.occupation,
            record.phone,
            record.mobile_phone,
            record.email,
            record.address,
            record.city,
            record.district,
            record.kvkk_consent,
            record.policy_no,
            record.renewal_no,
            record.endorsement_no,
            record.agency_code,
            record.company_code,
            record.company_name,
            record.main_branch,
            record.sub_branch,
            record.product_code,
            record.product_name,
            record.issue_date,
            record.start_date,
            record.end_date,
            record.gross_premium,
            record.net_premium,
            record.commission,
            record.currency,
            record.installment_count,
            record.plate_no,
            record.vehicle_brand,
            record.vehicle_model,
            record.vehicle_model_year,
            record.chassis_no,
            record.engine_no,
            now,
            national_id,
        ])?;
        Ok(affected)
    }
}

#[async_trait]
impl PolicyImportRepository for PolicyImportRepositoryImpl {
    async fn insert_policies(&self, records: &[PolicyRecord]) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let now = Utc::now();
        for record in records {
            Self::insert_record_tx(&tx, record, now)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(records.len())
    }

    async fn overwrite_policies(
        &self,
        records: &[PolicyRecord],
    ) -> RepositoryResult<(usize, usize)> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let now = Utc::now();
        let mut updated = 0;
        let mut inserted = 0;
        for record in records {
            match &record.national_id {
                Some(national_id) => {
                    if Self::overwrite_record_tx(&tx, record, national_id, now)? > 0 {
                        updated += 1;
                    } else {
                        Self::insert_record_tx(&tx, record, now)?;
                        inserted += 1;
                    }
                }
                None => {
                    Self::insert_record_tx(&tx, record, now)?;
                    inserted += 1;
                }
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((updated, inserted))
    }

    async fn find_customers_by_national_ids(
        &self,
        national_ids: &[String],
    ) -> RepositoryResult<Vec<ExistingCustomer>> {
        if national_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut result = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for chunk in national_ids.chunks(MAX_IN_PARAMS) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT record_id, national_id, account_code, customer_name, policy_no \
                 FROM policy_record WHERE national_id IN ({placeholders}) \
                 ORDER BY record_id DESC"
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                Ok(ExistingCustomer {
                    record_id: row.get(0)?,
                    national_id: row.get(1)?,
                    account_code: row.get(2)?,
                    customer_name: row.get(3)?,
                    policy_no: row.get(4)?,
                })
            })?;

            for row in rows {
                let customer = row?;
                // keep only the most recent record per national ID
                if seen.insert(customer.national_id.clone()) {
                    result.push(customer);
                }
            }
        }

        Ok(result)
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, resolution_policy, total_rows,
                created_rows, updated_rows, duplicate_rows, error_rows,
                imported_at, elapsed_ms, error_report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.resolution_policy,
                batch.total_rows,
                batch.created_rows,
                batch.updated_rows,
                batch.duplicate_rows,
                batch.error_rows,
                batch.imported_at,
                batch.elapsed_ms,
                batch.error_report_json,
            ],
        )?;
        Ok(())
    }
}
