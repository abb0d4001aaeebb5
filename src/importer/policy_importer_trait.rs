// ==========================================
// Sigorta CRM - policy importer trait
// ==========================================
// The import orchestrator interface. One import request owns its batch
// exclusively; nothing else mutates customer storage concurrently with it.
// ==========================================

use crate::domain::{
    CancelFlag, DuplicateCheck, ImportFormat, ImportOutcome, PolicyRecord, ResolutionPolicy,
};
use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

#[async_trait]
pub trait PolicyImporter: Send + Sync {
    /// Import one uploaded export file end to end.
    ///
    /// Pipeline: parse (with encoding normalization) -> decode rows ->
    /// duplicate check -> resolution policy -> chunked transactional
    /// persistence -> batch audit row.
    ///
    /// File-level problems (missing/unreadable file, wrong extension, empty
    /// file) abort with an error. Row- and batch-level problems are
    /// collected into the returned summary; a single bad row never aborts
    /// the rest of the file. `cancel` is honored at batch boundaries.
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        format: ImportFormat,
        policy: ResolutionPolicy,
        cancel: CancelFlag,
    ) -> Result<ImportOutcome, Box<dyn Error>>;

    /// Import already-decoded rows (the in-app import path, where the UI
    /// collected and confirmed the rows beforehand).
    ///
    /// Incoming `row_number` values are replaced with 1-based positions:
    /// caller-built records have no source file to number them by, and
    /// duplicate resolution requires every row to be addressable.
    async fn import_rows(
        &self,
        records: Vec<PolicyRecord>,
        policy: ResolutionPolicy,
        cancel: CancelFlag,
    ) -> Result<ImportOutcome, Box<dyn Error>>;

    /// Read-only duplicate check, used to drive the user-facing
    /// confirmation step before committing to a resolution policy.
    async fn check_duplicates(
        &self,
        records: &[PolicyRecord],
    ) -> Result<DuplicateCheck, Box<dyn Error>>;
}
