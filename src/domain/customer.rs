// ==========================================
// Sigorta CRM - customer profile read model
// ==========================================
// One aggregate per unique customer (keyed by hesap kodu), derived from
// all PolicyRecords sharing the account code. Profiles are recomputed
// wholesale by the synchronization step, never incrementally patched,
// so the aggregates cannot drift from the policy rows.
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub account_code: String,
    pub national_id: Option<String>,
    pub customer_name: Option<String>,

    // ===== aggregates over the customer's policy rows =====
    pub policy_count: i64,
    pub total_gross_premium: f64,
    pub total_net_premium: f64,
    pub products: Vec<String>, // distinct product names, serialized as JSON
    pub plates: Vec<String>,   // distinct vehicle plates, serialized as JSON
    pub first_policy_date: Option<NaiveDate>,
    pub last_policy_date: Option<NaiveDate>,

    // ===== AI-derived tags, written by an external collaborator =====
    pub ai_tags: Option<String>,

    pub updated_at: DateTime<Utc>,
}
