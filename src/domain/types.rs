// ==========================================
// Sigorta CRM - shared domain enums
// ==========================================
// Scope: import pipeline enums + cancellation flag
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ==========================================
// ResolutionPolicy - duplicate resolution
// ==========================================
// Applied after the duplicate check, chosen by the caller.
// Replacement is whole-record, never field-by-field merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionPolicy {
    /// Conflicting incoming rows replace the existing record's fields.
    OverwriteAll,
    /// Conflicting incoming rows are dropped; existing rows stay untouched.
    SkipDuplicates,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::OverwriteAll => "OVERWRITE_ALL",
            ResolutionPolicy::SkipDuplicates => "SKIP_DUPLICATES",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "OVERWRITE_ALL" | "OVERWRITE" => Some(ResolutionPolicy::OverwriteAll),
            "SKIP_DUPLICATES" | "SKIP" => Some(ResolutionPolicy::SkipDuplicates),
            _ => None,
        }
    }
}

// ==========================================
// SourceEncoding - input byte encoding
// ==========================================
// The legacy policy-management export is windows-1254 (Turkish single-byte
// code page). The newer comma variant is plain UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceEncoding {
    Windows1254,
    Utf8,
}

// ==========================================
// CsvFormat - per-file-format configuration
// ==========================================
// Delimiter, quoting style and encoding are fixed per export family and are
// never autodetected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CsvFormat {
    /// Primary export: semicolon-delimited, windows-1254, no quoting.
    SemicolonLegacy,
    /// Secondary export: comma-delimited, UTF-8, quote-aware.
    CommaQuoted,
}

impl CsvFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            CsvFormat::SemicolonLegacy => b';',
            CsvFormat::CommaQuoted => b',',
        }
    }

    pub fn quoting(&self) -> bool {
        matches!(self, CsvFormat::CommaQuoted)
    }

    pub fn encoding(&self) -> SourceEncoding {
        match self {
            CsvFormat::SemicolonLegacy => SourceEncoding::Windows1254,
            CsvFormat::CommaQuoted => SourceEncoding::Utf8,
        }
    }
}

// ==========================================
// ImportFormat - upload path selection
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportFormat {
    Csv(CsvFormat),
    Excel,
}

// ==========================================
// DateRepairMode - "00" day/month handling
// ==========================================
// The source system emits dates like "00-06-99". Coerce silently repairs
// day/month 00 to 01 (observed source behavior); Reject makes the value
// absent and records a row warning instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRepairMode {
    Coerce,
    Reject,
}

impl DateRepairMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRepairMode::Coerce => "coerce",
            DateRepairMode::Reject => "reject",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "coerce" => Some(DateRepairMode::Coerce),
            "reject" => Some(DateRepairMode::Reject),
            _ => None,
        }
    }
}

// ==========================================
// CancelFlag - cooperative cancellation
// ==========================================
// Honored by the orchestrator at batch boundaries only; an in-flight
// batch transaction always runs to completion or rolls back as a whole.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}
