// ==========================================
// Sigorta CRM - import layer
// ==========================================
// Bulk customer/policy import from legacy agency exports: byte decoding,
// header mapping, locale-aware value parsing, duplicate detection and
// the orchestrating importer.
// ==========================================

// Module declarations
pub mod duplicate_detector;
pub mod encoding;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod policy_importer_impl;
pub mod policy_importer_trait;
pub mod row_decoder;
pub mod value_parser;

// Re-export core types
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnLayout, FixedLayout, HeaderIndex};
pub use file_parser::{CsvParser, ExcelParser, FileParser, ParsedFile, UniversalFileParser};
pub use policy_importer_impl::PolicyImporterImpl;
pub use policy_importer_trait::PolicyImporter;
pub use row_decoder::{DecodedRow, RawRow, RowDecoder};
pub use value_parser::DateOutcome;
