// ==========================================
// Sigorta CRM - duplicate detector
// ==========================================
// Read-side only: pairs incoming rows against existing customers keyed by
// national ID and reports intra-batch repeats. No side effects; the
// resolution policy is the orchestrator's business.
// ==========================================

use crate::domain::{DuplicateConflict, ExistingCustomer, IntraBatchDuplicate, PolicyRecord};
use std::collections::HashMap;

/// Pair each incoming row that carries a national ID with the existing
/// record holding the same ID.
///
/// Every incoming row is checked independently: a batch containing the same
/// national ID twice produces two conflicts against the same existing
/// record, not one.
pub fn pair_with_existing(
    records: &[PolicyRecord],
    existing: &[ExistingCustomer],
) -> Vec<DuplicateConflict> {
    let by_id: HashMap<&str, &ExistingCustomer> = existing
        .iter()
        .map(|c| (c.national_id.as_str(), c))
        .collect();

    let mut conflicts = Vec::new();
    for record in records {
        if let Some(national_id) = &record.national_id {
            if let Some(&found) = by_id.get(national_id.as_str()) {
                conflicts.push(DuplicateConflict {
                    national_id: national_id.clone(),
                    existing: found.clone(),
                    incoming: record.clone(),
                });
            }
        }
    }

    conflicts
}

/// Report rows whose national ID already occurred earlier in the same
/// batch (every occurrence after the first).
pub fn detect_intra_batch(records: &[PolicyRecord]) -> Vec<IntraBatchDuplicate> {
    let mut first_occurrence: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for record in records {
        if let Some(national_id) = &record.national_id {
            match first_occurrence.get(national_id) {
                Some(&first_row) => duplicates.push(IntraBatchDuplicate {
                    row_number: record.row_number,
                    first_row_number: first_row,
                    national_id: national_id.clone(),
                }),
                None => {
                    first_occurrence.insert(national_id.clone(), record.row_number);
                }
            }
        }
    }

    duplicates
}
