// ==========================================
// Sigorta CRM - API layer
// ==========================================
// JSON-facing facade over the import pipeline.
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{
    DuplicateCheckResponse, ImportApi, ImportFileResponse, ImportRowsResponse,
};
