//! Domain layer - user accounts and credential rules.
//!
//! Pure schema and policy logic with no infrastructure dependencies; the
//! service and web crates build on these types.

pub mod constants;
pub mod error;
pub mod password;
pub mod password_validation;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
pub use password_validation::{
    PasswordPolicy, PasswordValidator, PasswordValidatorKind, UserAttributes,
};
pub use user::{
    next_modification, normalize_email, timestamp_now, CreateUser, NewUser, UpdateUser, User,
    UserChanges, UserFilter, UserResponse, UserRole,
};
