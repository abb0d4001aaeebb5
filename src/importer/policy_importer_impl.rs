// ==========================================
// Sigorta CRM - policy importer implementation
// ==========================================
// Orchestrates the import pipeline: parse -> decode -> duplicate check ->
// resolution policy -> chunked transactional persistence -> batch audit.
// Partial success is expected and reported, never treated as fatal: a bad
// row or a failed chunk is collected with its row range and the rest of
// the file proceeds.
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{
    CancelFlag, DuplicateCheck, ImportBatch, ImportFormat, ImportOutcome, ImportSummary,
    PolicyRecord, ResolutionPolicy, RowError,
};
use crate::importer::duplicate_detector;
use crate::importer::error::ImportError;
use crate::importer::field_mapper::ColumnLayout;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::policy_importer_trait::PolicyImporter;
use crate::repository::PolicyImportRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::error::Error;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub struct PolicyImporterImpl<R, C>
where
    R: PolicyImportRepository,
    C: ImportConfigReader,
{
    repo: R,
    config: C,
    parser: UniversalFileParser,
}

impl<R, C> PolicyImporterImpl<R, C>
where
    R: PolicyImportRepository,
    C: ImportConfigReader,
{
    pub fn new(repo: R, config: C) -> Self {
        Self {
            repo,
            config,
            parser: UniversalFileParser,
        }
    }
}

#[async_trait::async_trait]
impl<R, C> PolicyImporter for PolicyImporterImpl<R, C>
where
    R: PolicyImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path, cancel))]
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        format: ImportFormat,
        policy: ResolutionPolicy,
        cancel: CancelFlag,
    ) -> Result<ImportOutcome, Box<dyn Error>> {
        let batch_id = Uuid::new_v4().to_string();
        let file_name = file_path
            .as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());

        info!(
            batch_id = %batch_id,
            file = file_name.as_deref().unwrap_or("unknown"),
            policy = policy.as_str(),
            "starting file import"
        );

        // === stage 1: parse (fatal on file-level problems) ===
        let parsed = self.parser.parse(file_path.as_ref(), format).map_err(|e| {
            error!(batch_id = %batch_id, error = %e, "file parse failed");
            e
        })?;

        if parsed.rows.is_empty() {
            return Err(Box::new(ImportError::EmptyFile));
        }
        let total_rows = parsed.rows.len();
        info!(batch_id = %batch_id, total_rows, "file parsed");

        // === stage 2: decode rows ===
        // Name-based column mapping is used uniformly for uploads; the
        // fixed-index layout stays available for the frozen export family.
        let repair_mode = self.config.get_date_repair_mode().await?;
        let layout = ColumnLayout::by_name(&parsed.headers);
        let decoder = crate::importer::row_decoder::RowDecoder::new(layout, repair_mode);

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for row in &parsed.rows {
            match decoder.decode(row) {
                Ok(decoded) => {
                    for warning in &decoded.warnings {
                        warn!(batch_id = %batch_id, row = row.row_number, %warning, "row warning");
                    }
                    records.push(decoded.record);
                }
                Err(e) => {
                    warn!(batch_id = %batch_id, row = row.row_number, error = %e, "row skipped");
                    errors.push(RowError::decode(row.row_number, e.to_string()));
                }
            }
        }
        info!(
            batch_id = %batch_id,
            decoded = records.len(),
            failed = errors.len(),
            "row decoding finished"
        );

        self.run_import(
            batch_id, file_name, total_rows, records, errors, policy, cancel,
        )
        .await
    }

    async fn import_rows(
        &self,
        mut records: Vec<PolicyRecord>,
        policy: ResolutionPolicy,
        cancel: CancelFlag,
    ) -> Result<ImportOutcome, Box<dyn Error>> {
        let batch_id = Uuid::new_v4().to_string();
        let total_rows = records.len();

        // Caller-built records carry no source-file row numbers (Default
        // leaves all of them at 0). Partitioning and error reporting key
        // on the row number, so assign unique positional ones.
        for (idx, record) in records.iter_mut().enumerate() {
            record.row_number = idx + 1;
        }
        info!(batch_id = %batch_id, total_rows, policy = policy.as_str(), "starting row import");

        self.run_import(batch_id, None, total_rows, records, Vec::new(), policy, cancel)
            .await
    }

    async fn check_duplicates(
        &self,
        records: &[PolicyRecord],
    ) -> Result<DuplicateCheck, Box<dyn Error>> {
        let ids: Vec<String> = {
            let mut seen = HashSet::new();
            records
                .iter()
                .filter_map(|r| r.national_id.clone())
                .filter(|id| seen.insert(id.clone()))
                .collect()
        };

        let existing = self.repo.find_customers_by_national_ids(&ids).await?;
        let duplicates = duplicate_detector::pair_with_existing(records, &existing);

        let intra_batch_duplicates = if self.config.get_flag_intra_batch_duplicates().await? {
            duplicate_detector::detect_intra_batch(records)
        } else {
            Vec::new()
        };

        debug!(
            incoming = records.len(),
            conflicts = duplicates.len(),
            intra_batch = intra_batch_duplicates.len(),
            "duplicate check finished"
        );

        Ok(DuplicateCheck {
            has_duplicates: !duplicates.is_empty(),
            duplicates,
            intra_batch_duplicates,
        })
    }
}

impl<R, C> PolicyImporterImpl<R, C>
where
    R: PolicyImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    /// Shared tail of both import paths: duplicate check, partition per
    /// resolution policy, chunked persistence, batch audit row.
    #[allow(clippy::too_many_arguments)]
    async fn run_import(
        &self,
        batch_id: String,
        file_name: Option<String>,
        total_rows: usize,
        records: Vec<PolicyRecord>,
        mut errors: Vec<RowError>,
        policy: ResolutionPolicy,
        cancel: CancelFlag,
    ) -> Result<ImportOutcome, Box<dyn Error>> {
        let start = Instant::now();

        // === duplicate check ===
        let check = self.check_duplicates(&records).await?;
        let conflict_rows: HashSet<usize> = check
            .duplicates
            .iter()
            .map(|c| c.incoming.row_number)
            .collect();
        let intra_rows: HashSet<usize> = check
            .intra_batch_duplicates
            .iter()
            .map(|d| d.row_number)
            .collect();

        // === partition per resolution policy ===
        // Replacement is whole-record: conflicting rows either replace the
        // stored record or are dropped, never merged field-by-field.
        let mut to_insert = Vec::new();
        let mut to_overwrite = Vec::new();
        let mut duplicates = 0usize;

        for record in records {
            let is_conflict = conflict_rows.contains(&record.row_number);
            match policy {
                ResolutionPolicy::OverwriteAll => {
                    if is_conflict {
                        duplicates += 1;
                        to_overwrite.push(record);
                    } else {
                        to_insert.push(record);
                    }
                }
                ResolutionPolicy::SkipDuplicates => {
                    if is_conflict || intra_rows.contains(&record.row_number) {
                        duplicates += 1; // dropped, store stays untouched
                    } else {
                        to_insert.push(record);
                    }
                }
            }
        }

        // === chunked persistence ===
        let batch_size = self.config.get_batch_size().await?.max(1);
        let mut created = 0usize;
        let mut updated = 0usize;
        let mut cancelled = false;

        let insert_chunks: Vec<&[PolicyRecord]> = to_insert.chunks(batch_size).collect();
        let overwrite_chunks: Vec<&[PolicyRecord]> = to_overwrite.chunks(batch_size).collect();

        for (idx, chunk) in insert_chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                // the overwrite phase never starts, so its rows are
                // skipped work too and must be reported as such
                Self::record_cancellation(&insert_chunks[idx..], &mut errors);
                Self::record_cancellation(&overwrite_chunks, &mut errors);
                cancelled = true;
                break;
            }

            match self.repo.insert_policies(chunk).await {
                Ok(n) => created += n,
                Err(e) => {
                    let (first, last) = chunk_row_range(chunk);
                    error!(
                        batch_id = %batch_id,
                        first_row = first,
                        last_row = last,
                        error = %e,
                        "insert batch failed, continuing with next batch"
                    );
                    errors.push(RowError::persist(first, last, chunk.len(), e.to_string()));
                }
            }
        }

        if !cancelled {
            for (idx, chunk) in overwrite_chunks.iter().enumerate() {
                if cancel.is_cancelled() {
                    Self::record_cancellation(&overwrite_chunks[idx..], &mut errors);
                    cancelled = true;
                    break;
                }

                match self.repo.overwrite_policies(chunk).await {
                    Ok((n_updated, n_inserted)) => {
                        updated += n_updated;
                        created += n_inserted;
                    }
                    Err(e) => {
                        let (first, last) = chunk_row_range(chunk);
                        error!(
                            batch_id = %batch_id,
                            first_row = first,
                            last_row = last,
                            error = %e,
                            "overwrite batch failed, continuing with next batch"
                        );
                        errors.push(RowError::persist(first, last, chunk.len(), e.to_string()));
                    }
                }
            }
        }

        // === batch audit row ===
        let elapsed = start.elapsed();
        let summary = ImportSummary {
            total_rows,
            created,
            updated,
            duplicates,
            errors,
            cancelled,
        };

        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            file_name,
            resolution_policy: policy.as_str().to_string(),
            total_rows: total_rows as i64,
            created_rows: created as i64,
            updated_rows: updated as i64,
            duplicate_rows: duplicates as i64,
            error_rows: summary.error_rows() as i64,
            imported_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as i64,
            error_report_json: if summary.errors.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&summary.errors)?)
            },
        };
        self.repo.insert_import_batch(&batch).await?;

        info!(
            batch_id = %batch_id,
            total = total_rows,
            created,
            updated,
            duplicates,
            error_rows = batch.error_rows,
            cancelled,
            elapsed_ms = elapsed.as_millis() as i64,
            "import finished"
        );

        Ok(ImportOutcome {
            batch,
            summary,
            elapsed,
        })
    }

    /// Mark every not-yet-persisted chunk as skipped by cancellation.
    fn record_cancellation(remaining: &[&[PolicyRecord]], errors: &mut Vec<RowError>) {
        let first = remaining
            .first()
            .and_then(|c| c.first())
            .map(|r| r.row_number);
        let last = remaining.last().and_then(|c| c.last()).map(|r| r.row_number);
        if let (Some(first), Some(last)) = (first, last) {
            let row_count = remaining.iter().map(|c| c.len()).sum();
            warn!(first_row = first, last_row = last, row_count, "import cancelled, remaining rows skipped");
            errors.push(RowError::cancelled(
                first,
                last,
                row_count,
                ImportError::Cancelled.to_string(),
            ));
        }
    }
}

fn chunk_row_range(chunk: &[PolicyRecord]) -> (usize, usize) {
    let first = chunk.first().map(|r| r.row_number).unwrap_or(0);
    let last = chunk.last().map(|r| r.row_number).unwrap_or(first);
    (first, last)
}
