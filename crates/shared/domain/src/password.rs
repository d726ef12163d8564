//! Password value object - hashing and verification of credentials.
//!
//! Plaintext only exists for the duration of [`Password::new`]; what the
//! value object holds (and what gets persisted) is an Argon2 PHC string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::constants::MAX_PASSWORD_HASH_LENGTH;
use crate::error::{DomainError, DomainResult};
use crate::password_validation::{PasswordPolicy, UserAttributes};

/// Hashed credential.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Run `policy` against the plaintext, then hash it.
    ///
    /// # Errors
    /// Returns [`DomainError::Password`] with every rule the plaintext broke.
    pub fn new(
        plain_text: &str,
        policy: &PasswordPolicy,
        user: &UserAttributes<'_>,
    ) -> DomainResult<Self> {
        policy.validate(plain_text, user)?;
        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Accept an externally produced hash after checking it is a PHC string.
    ///
    /// Refuses anything that does not parse as a hash, so plaintext can't be
    /// stored by accident.
    pub fn parse_hash(hash: impl Into<String>) -> DomainResult<Self> {
        let hash = hash.into();
        if hash.len() as u64 > MAX_PASSWORD_HASH_LENGTH {
            return Err(DomainError::validation(format!(
                "Password hash must be at most {} characters",
                MAX_PASSWORD_HASH_LENGTH
            )));
        }
        PasswordHash::new(&hash)
            .map_err(|_| DomainError::password("Credential is not a recognized password hash."))?;
        Ok(Self { hash })
    }

    /// Wrap a hash loaded from storage.
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        Self::verify_hash(plain_text, &self.hash).unwrap_or(false)
    }

    fn hash(plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_hash(plain_text: &str, hash: &str) -> DomainResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| DomainError::internal(format!("Invalid hash format: {}", e)))?;
        Ok(Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}
