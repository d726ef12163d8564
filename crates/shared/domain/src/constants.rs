//! Domain-level constants.
//!
//! These constants define the storage limits and validation rules of the
//! user account schema.

// =============================================================================
// User Roles
// =============================================================================

/// Client account: hires services
pub const ROLE_CLIENT: &str = "cliente";

/// Provider account: offers services
pub const ROLE_PROVIDER: &str = "prestador";

/// Administrator account
pub const ROLE_ADMIN: &str = "admin";

/// All valid role values, in declaration order
pub const VALID_ROLES: &[&str] = &[ROLE_CLIENT, ROLE_PROVIDER, ROLE_ADMIN];

// =============================================================================
// Column limits
// =============================================================================

pub const MAX_NAME_LENGTH: u64 = 100;

/// Longest address allowed by RFC 5321 paths
pub const MAX_EMAIL_LENGTH: u64 = 254;

pub const MAX_PASSWORD_HASH_LENGTH: u64 = 255;

pub const MAX_PHONE_LENGTH: u64 = 20;

pub const MAX_ROLE_LENGTH: u64 = 20;

/// `000.000.000-00`
pub const MAX_CPF_LENGTH: u64 = 14;

/// `00.000.000/0000-00`
pub const MAX_CNPJ_LENGTH: u64 = 18;

// =============================================================================
// Password policy
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Similarity ratio at which a password is considered too close to a user attribute
pub const DEFAULT_MAX_SIMILARITY: f64 = 0.7;

/// Lowest similarity threshold accepted by the similarity validator
pub const MIN_SIMILARITY_THRESHOLD: f64 = 0.1;
