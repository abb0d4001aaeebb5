// ==========================================
// Sigorta CRM - policy import repository trait
// ==========================================
// Data access for the import pipeline. Repositories stay free of business
// rules: the resolution policy and batching decisions live in the
// orchestrator, this layer only persists what it is handed, one
// transaction per call.
// ==========================================

use crate::domain::{ExistingCustomer, ImportBatch, PolicyRecord};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

#[async_trait]
pub trait PolicyImportRepository: Send + Sync {
    /// Insert one chunk of new policy rows in a single transaction.
    /// All-or-nothing: a failure rolls the whole chunk back.
    ///
    /// Returns the number of rows inserted.
    async fn insert_policies(&self, records: &[PolicyRecord]) -> RepositoryResult<usize>;

    /// Replace existing records with conflicting incoming rows, in a single
    /// transaction. Replacement is whole-record by national ID, never a
    /// field-by-field merge. An incoming row whose national ID no longer
    /// matches anything is inserted instead.
    ///
    /// Returns `(updated, inserted)` counts over the incoming rows.
    async fn overwrite_policies(&self, records: &[PolicyRecord])
        -> RepositoryResult<(usize, usize)>;

    /// Look up existing customers by national ID. Returns at most one
    /// (the most recent) record per requested ID.
    async fn find_customers_by_national_ids(
        &self,
        national_ids: &[String],
    ) -> RepositoryResult<Vec<ExistingCustomer>>;

    /// Persist the batch audit row once the import has finished.
    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;
}
