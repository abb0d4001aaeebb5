// ==========================================
// Sigorta CRM - policy/customer domain model
// ==========================================
// PolicyRecord mirrors one row of the external policy-management export.
// Every attribute is optional: unparseable or blank cells become None,
// never zero or empty string. Written by the import layer, read-only to
// everything above it except the premium correction utilities.
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ==========================================
// PolicyRecord - one decoded export row
// ==========================================
// Identity keys: account_code (hesap kodu) and national_id (TC kimlik /
// vergi no). Duplicate detection keys on national_id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyRecord {
    // ===== customer identity =====
    pub account_code: Option<String>,  // hesap kodu - stable customer key
    pub national_id: Option<String>,   // TC kimlik no / vergi no
    pub customer_name: Option<String>, // adı soyadı
    pub customer_type: Option<String>, // bireysel / kurumsal
    pub birth_date: Option<NaiveDate>,
    pub occupation: Option<String>,

    // ===== contact / address =====
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,     // il
    pub district: Option<String>, // ilçe
    pub kvkk_consent: Option<String>, // KVKK onay flag, kept as source text

    // ===== policy identifiers =====
    pub policy_no: Option<String>,
    pub renewal_no: Option<i64>,     // tecdit no
    pub endorsement_no: Option<i64>, // zeyil no
    pub agency_code: Option<String>,
    pub company_code: Option<String>,
    pub company_name: Option<String>,

    // ===== branch / product =====
    pub main_branch: Option<String>, // ana branş
    pub sub_branch: Option<String>,  // ara branş
    pub product_code: Option<String>,
    pub product_name: Option<String>,

    // ===== dates =====
    pub issue_date: Option<NaiveDate>, // tanzim tarihi
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    // ===== premiums =====
    pub gross_premium: Option<f64>, // brüt prim
    pub net_premium: Option<f64>,   // net prim
    pub commission: Option<f64>,
    pub currency: Option<String>,
    pub installment_count: Option<i64>,

    // ===== vehicle =====
    pub plate_no: Option<String>,
    pub vehicle_brand: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_model_year: Option<i64>,
    pub chassis_no: Option<String>,
    pub engine_no: Option<String>,

    // ===== meta =====
    pub row_number: usize, // 1-based data-row number in the source file
}

// ==========================================
// ExistingCustomer - store-side conflict half
// ==========================================
// Minimal projection of a persisted policy_record row, enough for the
// caller to present the conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingCustomer {
    pub record_id: i64,
    pub national_id: String,
    pub account_code: Option<String>,
    pub customer_name: Option<String>,
    pub policy_no: Option<String>,
}

// ==========================================
// DuplicateConflict - (existing, incoming) pair
// ==========================================
// Produced by the duplicate check, consumed by the resolution step,
// discarded after. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateConflict {
    pub national_id: String,
    pub existing: ExistingCustomer,
    pub incoming: PolicyRecord,
}

/// Intra-batch repeat: an incoming row whose national ID already occurred
/// earlier in the same file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntraBatchDuplicate {
    pub row_number: usize,
    pub first_row_number: usize,
    pub national_id: String,
}

/// Result of a read-only duplicate check, returned to the caller before it
/// commits to a resolution policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub has_duplicates: bool,
    pub duplicates: Vec<DuplicateConflict>,
    pub intra_batch_duplicates: Vec<IntraBatchDuplicate>,
}

// ==========================================
// RowError - accumulated row/batch errors
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorKind {
    /// Malformed or too-short source row, skipped before persistence.
    Decode,
    /// One persistence batch failed as a whole.
    Persist,
    /// Remaining batches were skipped after cancellation.
    Cancelled,
}

/// One collected error, covering a single row (first == last) or a
/// contiguous row range for batch persistence failures.
///
/// `row_count` is the number of rows actually affected. It can be smaller
/// than the range width: decode-failed rows keep their numbers between a
/// chunk's endpoints even though they never reached persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub first_row: usize,
    pub last_row: usize,
    pub row_count: usize,
    pub kind: RowErrorKind,
    pub message: String,
}

impl RowError {
    pub fn decode(row: usize, message: impl Into<String>) -> Self {
        Self {
            first_row: row,
            last_row: row,
            row_count: 1,
            kind: RowErrorKind::Decode,
            message: message.into(),
        }
    }

    pub fn persist(
        first_row: usize,
        last_row: usize,
        row_count: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            first_row,
            last_row,
            row_count,
            kind: RowErrorKind::Persist,
            message: message.into(),
        }
    }

    pub fn cancelled(
        first_row: usize,
        last_row: usize,
        row_count: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            first_row,
            last_row,
            row_count,
            kind: RowErrorKind::Cancelled,
            message: message.into(),
        }
    }
}

// ==========================================
// ImportSummary - per-import counts
// ==========================================
// Callers always receive the full count set, never a bare success flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub errors: Vec<RowError>,
    pub cancelled: bool,
}

impl ImportSummary {
    pub fn error_rows(&self) -> usize {
        self.errors.iter().map(|e| e.row_count).sum()
    }
}

// ==========================================
// ImportBatch - persisted batch audit row
// ==========================================
// The decoded rows are ephemeral; only this summary row and its effects
// survive the import request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub resolution_policy: String,
    pub total_rows: i64,
    pub created_rows: i64,
    pub updated_rows: i64,
    pub duplicate_rows: i64,
    pub error_rows: i64,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub error_report_json: Option<String>,
}

/// Full outcome handed back by the importer.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub batch: ImportBatch,
    pub summary: ImportSummary,
    pub elapsed: Duration,
}
