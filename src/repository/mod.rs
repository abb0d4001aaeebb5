// ==========================================
// Sigorta CRM - repository layer
// ==========================================
// Data access only: no business rules, all queries parameterized.
// ==========================================

pub mod customer_profile_repo;
pub mod error;
pub mod policy_import_repo;
pub mod policy_import_repo_impl;

pub use customer_profile_repo::{CustomerProfileRepository, CustomerProfileRepositoryImpl};
pub use error::{RepositoryError, RepositoryResult};
pub use policy_import_repo::PolicyImportRepository;
pub use policy_import_repo_impl::PolicyImportRepositoryImpl;
