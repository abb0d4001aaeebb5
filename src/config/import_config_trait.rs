// ==========================================
// Sigorta CRM - import configuration trait
// ==========================================
// Read-only configuration seam consumed by the import orchestrator and the
// correction utilities. No configuration writes, no business logic.
// ==========================================

use crate::domain::DateRepairMode;
use async_trait::async_trait;
use std::error::Error;

#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// Rows per persistence transaction.
    ///
    /// # Default
    /// - 100
    async fn get_batch_size(&self) -> Result<usize, Box<dyn Error>>;

    /// How a "00" day/month component in source dates is handled.
    ///
    /// # Default
    /// - Coerce (repair to "01", the observed source behavior)
    async fn get_date_repair_mode(&self) -> Result<DateRepairMode, Box<dyn Error>>;

    /// Whether repeated national IDs inside one file are reported and
    /// deduplicated under SkipDuplicates.
    ///
    /// # Default
    /// - true
    async fn get_flag_intra_batch_duplicates(&self) -> Result<bool, Box<dyn Error>>;

    /// Gross/net ratio above which the correction heuristic treats a gross
    /// premium as x10-inflated.
    ///
    /// # Default
    /// - 5.0
    async fn get_correction_ratio_threshold(&self) -> Result<f64, Box<dyn Error>>;

    /// Absolute gross premium above which a row without a usable net
    /// premium is treated as x10-inflated.
    ///
    /// # Default
    /// - 10000.0
    async fn get_correction_absolute_threshold(&self) -> Result<f64, Box<dyn Error>>;
}
