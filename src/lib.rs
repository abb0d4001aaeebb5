// ==========================================
// Sigorta CRM - core library
// ==========================================
// Bulk customer/policy import and reconciliation for an insurance
// agency CRM: legacy export parsing, duplicate detection, chunked
// transactional persistence and data repair utilities.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Import layer - external data
pub mod importer;

// Configuration layer
pub mod config;

// Database infrastructure (connection setup / uniform PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// API layer - business facade
pub mod api;

// Maintenance layer - data repair utilities
pub mod maintenance;

// ==========================================
// Re-export core types
// ==========================================

// Domain types
pub use domain::{
    CancelFlag, CsvFormat, DateRepairMode, ImportFormat, ResolutionPolicy, SourceEncoding,
};

// Domain entities
pub use domain::{
    CustomerProfile, DuplicateCheck, DuplicateConflict, ExistingCustomer, ImportBatch,
    ImportOutcome, ImportSummary, IntraBatchDuplicate, PolicyRecord, RowError, RowErrorKind,
};

// Importer
pub use importer::{PolicyImporter, PolicyImporterImpl, UniversalFileParser};

// API
pub use api::ImportApi;

// Maintenance
pub use maintenance::PremiumCorrectionService;

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Application name
pub const APP_NAME: &str = "Sigorta CRM";
