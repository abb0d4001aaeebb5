// ==========================================
// Sigorta CRM - customer profile repository
// ==========================================
// The profile table is a derived read model. Synchronization recomputes
// every profile from the policy rows sharing its account code; nothing is
// incrementally patched, so the aggregates cannot drift. AI tags are owned
// by an external collaborator and are carried over across rebuilds.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::CustomerProfile;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

#[async_trait]
pub trait CustomerProfileRepository: Send + Sync {
    /// Recompute every profile from the current policy rows.
    /// Returns the number of profiles written.
    async fn rebuild_profiles(&self) -> RepositoryResult<usize>;

    async fn get_profile(&self, account_code: &str) -> RepositoryResult<Option<CustomerProfile>>;
}

pub struct CustomerProfileRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerProfileRepositoryImpl {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

/// Per-account accumulator used during the rebuild.
#[derive(Default)]
struct ProfileAccumulator {
    national_id: Option<String>,
    customer_name: Option<String>,
    policy_count: i64,
    total_gross_premium: f64,
    total_net_premium: f64,
    products: Vec<String>,
    plates: Vec<String>,
    first_policy_date: Option<NaiveDate>,
    last_policy_date: Option<NaiveDate>,
}

impl ProfileAccumulator {
    fn add_row(
        &mut self,
        national_id: Option<String>,
        customer_name: Option<String>,
        gross: Option<f64>,
        net: Option<f64>,
        product: Option<String>,
        plate: Option<String>,
        start_date: Option<NaiveDate>,
    ) {
        self.policy_count += 1;
        self.total_gross_premium += gross.unwrap_or(0.0);
        self.total_net_premium += net.unwrap_or(0.0);

        if self.national_id.is_none() {
            self.national_id = national_id;
        }
        if self.customer_name.is_none() {
            self.customer_name = customer_name;
        }
        if let Some(p) = product {
            if !self.products.contains(&p) {
                self.products.push(p);
            }
        }
        if let Some(p) = plate {
            if !self.plates.contains(&p) {
                self.plates.push(p);
            }
        }
        if let Some(d) = start_date {
            self.first_policy_date = Some(match self.first_policy_date {
                Some(cur) => cur.min(d),
                None => d,
            });
            self.last_policy_date = Some(match self.last_policy_date {
                Some(cur) => cur.max(d),
                None => d,
            });
        }
    }
}

#[async_trait]
impl CustomerProfileRepository for CustomerProfileRepositoryImpl {
    async fn rebuild_profiles(&self) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // AI tags belong to an external collaborator; keep them across the
        // wholesale rebuild.
        let mut preserved_tags: HashMap<String, String> = HashMap::new();
        {
            let mut stmt = tx.prepare(
                "SELECT account_code, ai_tags FROM customer_profile WHERE ai_tags IS NOT NULL",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (account_code, tags) = row?;
                preserved_tags.insert(account_code, tags);
            }
        }

        let mut profiles: HashMap<String, ProfileAccumulator> = HashMap::new();
        {
            let mut stmt = tx.prepare(
                r#"
                SELECT account_code, national_id, customer_name, gross_premium,
                       net_premium, product_name, plate_no, start_date
                FROM policy_record
                WHERE account_code IS NOT NULL
                ORDER BY record_id
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<NaiveDate>>(7)?,
                ))
            })?;

            for row in rows {
                let (account_code, national_id, name, gross, net, product, plate, start) = row?;
                profiles.entry(account_code).or_default().add_row(
                    national_id,
                    name,
                    gross,
                    net,
                    product,
                    plate,
                    start,
                );
            }
        }

        tx.execute("DELETE FROM customer_profile", [])?;

        let now = Utc::now();
        let count = profiles.len();
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO customer_profile (
                    account_code, national_id, customer_name, policy_count,
                    total_gross_premium, total_net_premium, products_json,
                    plates_json, first_policy_date, last_policy_date,
                    ai_tags, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;

            for (account_code, acc) in &profiles {
                stmt.execute(params![
                    account_code,
                    acc.national_id,
                    acc.customer_name,
                    acc.policy_count,
                    acc.total_gross_premium,
                    acc.total_net_premium,
                    serde_json::to_string(&acc.products)?,
                    serde_json::to_string(&acc.plates)?,
                    acc.first_policy_date,
                    acc.last_policy_date,
                    preserved_tags.get(account_code),
                    now,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(profiles = count, "customer profiles rebuilt");
        Ok(count)
    }

    async fn get_profile(&self, account_code: &str) -> RepositoryResult<Option<CustomerProfile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT account_code, national_id, customer_name, policy_count,
                   total_gross_premium, total_net_premium, products_json,
                   plates_json, first_policy_date, last_policy_date,
                   ai_tags, updated_at
            FROM customer_profile WHERE account_code = ?1
            "#,
        )?;

        let mut rows = stmt.query_map(params![account_code], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, Option<NaiveDate>>(8)?,
                row.get::<_, Option<NaiveDate>>(9)?,
                row.get::<_, Option<String>>(10)?,
                row.get::<_, chrono::DateTime<Utc>>(11)?,
            ))
        })?;

        match rows.next() {
            Some(row) => {
                let (
                    account_code,
                    national_id,
                    customer_name,
                    policy_count,
                    total_gross,
                    total_net,
                    products_json,
                    plates_json,
                    first_date,
                    last_date,
                    ai_tags,
                    updated_at,
                ) = row?;

                Ok(Some(CustomerProfile {
                    account_code,
                    national_id,
                    customer_name,
                    policy_count,
                    total_gross_premium: total_gross,
                    total_net_premium: total_net,
                    products: serde_json::from_str(&products_json)?,
                    plates: serde_json::from_str(&plates_json)?,
                    first_policy_date: first_date,
                    last_policy_date: last_date,
                    ai_tags,
                    updated_at,
                }))
            }
            None => Ok(None),
        }
    }
}
