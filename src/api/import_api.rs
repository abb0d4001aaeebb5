// ==========================================
// Sigorta CRM - import API
// ==========================================
// Facade over the import pipeline for callers that speak JSON (the
// desktop shell and integration scripts). Response structs serialize
// in camelCase to match the existing frontend contract.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::domain::{
    CancelFlag, DuplicateConflict, ImportFormat, IntraBatchDuplicate, PolicyRecord,
    ResolutionPolicy,
};
use crate::importer::{PolicyImporter, PolicyImporterImpl};
use crate::repository::PolicyImportRepositoryImpl;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Duplicate check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResponse {
    /// True when at least one incoming row matches a stored customer.
    pub has_duplicates: bool,
    /// One entry per conflicting incoming row.
    pub duplicates: Vec<DuplicateConflict>,
    /// Rows repeating a national ID seen earlier in the same batch.
    pub intra_batch_duplicates: Vec<IntraBatchDuplicate>,
}

/// Row import response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowsResponse {
    pub created: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub batch_id: String,
}

/// File import response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileResponse {
    pub created: usize,
    pub updated: usize,
    pub duplicates: usize,
    /// Number of rows that failed to decode or persist.
    pub errors: usize,
    pub total_rows: usize,
    pub cancelled: bool,
    pub batch_id: String,
    pub elapsed_ms: i64,
}

/// Import API.
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// Check a parsed batch against the customer store without writing.
    pub async fn check_duplicates(
        &self,
        records: &[PolicyRecord],
    ) -> ApiResult<DuplicateCheckResponse> {
        let importer = self.create_importer()?;
        let check = importer
            .check_duplicates(records)
            .await
            .map_err(|e| ApiError::ImportError(e.to_string()))?;

        Ok(DuplicateCheckResponse {
            has_duplicates: check.has_duplicates,
            duplicates: check.duplicates,
            intra_batch_duplicates: check.intra_batch_duplicates,
        })
    }

    /// Import already-parsed rows.
    ///
    /// `overwrite = true` replaces stored records whose national ID
    /// matches an incoming row; `false` keeps them untouched and drops
    /// the incoming duplicates.
    pub async fn import_customers(
        &self,
        records: Vec<PolicyRecord>,
        overwrite: bool,
        cancel: CancelFlag,
    ) -> ApiResult<ImportRowsResponse> {
        if records.is_empty() {
            return Err(ApiError::InvalidInput("no rows provided".to_string()));
        }

        let importer = self.create_importer()?;
        let policy = if overwrite {
            ResolutionPolicy::OverwriteAll
        } else {
            ResolutionPolicy::SkipDuplicates
        };

        let outcome = importer
            .import_rows(records, policy, cancel)
            .await
            .map_err(|e| ApiError::ImportError(e.to_string()))?;

        Ok(ImportRowsResponse {
            created: outcome.summary.created,
            updated: outcome.summary.updated,
            duplicates: outcome.summary.duplicates,
            batch_id: outcome.batch.batch_id,
        })
    }

    /// Import a legacy export file end to end.
    pub async fn import_file(
        &self,
        file_path: &str,
        format: ImportFormat,
        overwrite: bool,
        cancel: CancelFlag,
    ) -> ApiResult<ImportFileResponse> {
        let importer = self.create_importer()?;
        let policy = if overwrite {
            ResolutionPolicy::OverwriteAll
        } else {
            ResolutionPolicy::SkipDuplicates
        };

        let outcome = importer
            .import_file(file_path, format, policy, cancel)
            .await
            .map_err(|e| ApiError::ImportError(e.to_string()))?;

        let summary = &outcome.summary;
        let error_rows = summary.error_rows();

        // A file where every single row failed is an operator problem
        // (wrong file, wrong format), not a partial success.
        if summary.total_rows > 0
            && summary.created == 0
            && summary.updated == 0
            && summary.duplicates == 0
            && error_rows == summary.total_rows
        {
            return Err(ApiError::ImportError(format!(
                "no rows imported: all {} rows failed, check the file format and encoding",
                summary.total_rows
            )));
        }

        Ok(ImportFileResponse {
            created: summary.created,
            updated: summary.updated,
            duplicates: summary.duplicates,
            errors: error_rows,
            total_rows: summary.total_rows,
            cancelled: summary.cancelled,
            batch_id: outcome.batch.batch_id.clone(),
            elapsed_ms: outcome.batch.elapsed_ms,
        })
    }

    /// Wire up the importer; repository and config share one connection.
    fn create_importer(
        &self,
    ) -> ApiResult<PolicyImporterImpl<PolicyImportRepositoryImpl, ConfigManager>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let repo = PolicyImportRepositoryImpl::from_connection(Arc::clone(&conn));
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Ok(PolicyImporterImpl::new(repo, config))
    }
}
