// ==========================================
// Sigorta CRM - gross premium correction
// ==========================================
// A historical importer bug multiplied gross premiums by ten (the
// decimal comma was dropped before parsing). This service finds the
// inflated records and divides them back, writing an audit row per
// change. A record is corrected at most once: anything already present
// in premium_correction_log is skipped, so re-running is safe.
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument};

/// Thresholds deciding when a gross premium looks tenfold inflated.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionThresholds {
    /// A gross/net ratio above this is suspect. Agency commission
    /// structures keep the real ratio well under this value.
    pub ratio: f64,
    /// Fallback for records without a usable net premium: a gross
    /// premium above this absolute amount is suspect.
    pub absolute: f64,
}

impl Default for CorrectionThresholds {
    fn default() -> Self {
        Self {
            ratio: 5.0,
            absolute: 10_000.0,
        }
    }
}

/// One record flagged by the scan.
#[derive(Debug, Clone)]
pub struct SuspectPremium {
    pub record_id: i64,
    pub policy_no: Option<String>,
    pub gross_premium: f64,
    pub net_premium: Option<f64>,
    /// gross/net, absent when there is no usable net premium.
    pub ratio: Option<f64>,
}

impl SuspectPremium {
    pub fn corrected_gross(&self) -> f64 {
        self.gross_premium / 10.0
    }
}

/// Result of a correction run.
#[derive(Debug)]
pub struct CorrectionReport {
    /// Records with a gross premium that were eligible for scanning.
    pub scanned: usize,
    pub suspects: Vec<SuspectPremium>,
    /// Number of records actually updated (0 on a dry run).
    pub corrected: usize,
    pub dry_run: bool,
}

pub struct PremiumCorrectionService {
    conn: Arc<Mutex<Connection>>,
}

impl PremiumCorrectionService {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Scan for suspect records without touching anything.
    #[instrument(skip(self))]
    pub fn scan(&self, thresholds: CorrectionThresholds) -> RepositoryResult<CorrectionReport> {
        let conn = self.lock()?;
        let (scanned, suspects) = Self::collect_suspects(&conn, thresholds)?;
        info!(scanned, suspects = suspects.len(), "premium scan finished");
        Ok(CorrectionReport {
            scanned,
            suspects,
            corrected: 0,
            dry_run: true,
        })
    }

    /// Scan and divide every suspect gross premium by ten, writing an
    /// audit row per change. Runs in a single transaction.
    #[instrument(skip(self))]
    pub fn apply(&self, thresholds: CorrectionThresholds) -> RepositoryResult<CorrectionReport> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let (scanned, suspects) = Self::collect_suspects(&tx, thresholds)?;
        let now = Utc::now().to_rfc3339();

        for suspect in &suspects {
            let new_gross = suspect.corrected_gross();
            tx.execute(
                "UPDATE policy_record SET gross_premium = ?1, updated_at = ?2 WHERE record_id = ?3",
                params![new_gross, now, suspect.record_id],
            )?;
            tx.execute(
                "INSERT INTO premium_correction_log
                     (record_id, old_gross, new_gross, net_premium, ratio, corrected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    suspect.record_id,
                    suspect.gross_premium,
                    new_gross,
                    suspect.net_premium,
                    suspect.ratio,
                    now
                ],
            )?;
            info!(
                record_id = suspect.record_id,
                policy_no = suspect.policy_no.as_deref().unwrap_or(""),
                old_gross = suspect.gross_premium,
                new_gross,
                "gross premium corrected"
            );
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let corrected = suspects.len();
        info!(scanned, corrected, "premium correction finished");
        Ok(CorrectionReport {
            scanned,
            suspects,
            corrected,
            dry_run: false,
        })
    }

    fn collect_suspects(
        conn: &Connection,
        thresholds: CorrectionThresholds,
    ) -> RepositoryResult<(usize, Vec<SuspectPremium>)> {
        let mut stmt = conn.prepare(
            "SELECT record_id, policy_no, gross_premium, net_premium
             FROM policy_record
             WHERE gross_premium IS NOT NULL
               AND record_id NOT IN (SELECT record_id FROM premium_correction_log)
             ORDER BY record_id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        let mut scanned = 0usize;
        let mut suspects = Vec::new();
        for row in rows {
            let (record_id, policy_no, gross, net) = row?;
            scanned += 1;

            let ratio = match net {
                Some(n) if n > 0.0 => Some(gross / n),
                _ => None,
            };
            let suspect = match ratio {
                Some(r) => r > thresholds.ratio,
                None => gross > thresholds.absolute,
            };
            if suspect {
                suspects.push(SuspectPremium {
                    record_id,
                    policy_no,
                    gross_premium: gross,
                    net_premium: net,
                    ratio,
                });
            }
        }

        Ok((scanned, suspects))
    }
}
