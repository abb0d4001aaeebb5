// ==========================================
// Sigorta CRM - domain layer
// ==========================================
// Entities and shared types. No I/O, no business orchestration.
// ==========================================

pub mod customer;
pub mod policy;
pub mod types;

pub use customer::CustomerProfile;
pub use policy::{
    DuplicateCheck, DuplicateConflict, ExistingCustomer, ImportBatch, ImportOutcome,
    ImportSummary, IntraBatchDuplicate, PolicyRecord, RowError, RowErrorKind,
};
pub use types::{
    CancelFlag, CsvFormat, DateRepairMode, ImportFormat, ResolutionPolicy, SourceEncoding,
};
