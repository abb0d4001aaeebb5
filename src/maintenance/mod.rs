// ==========================================
// Sigorta CRM - maintenance layer
// ==========================================
// One-off data repair utilities run against an existing database.
// ==========================================

pub mod premium_correction;

pub use premium_correction::{
    CorrectionReport, CorrectionThresholds, PremiumCorrectionService, SuspectPremium,
};
