//! Password strength policies applied when a credential is set.
//!
//! A [`PasswordPolicy`] is an ordered list of [`PasswordValidator`]s. Every
//! validator runs; failures are collected and reported together.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{DEFAULT_MAX_SIMILARITY, MIN_PASSWORD_LENGTH, MIN_SIMILARITY_THRESHOLD};
use crate::error::{DomainError, DomainResult};

static COMMON_PASSWORDS: &str = include_str!("../resources/common-passwords.txt");

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// User fields the similarity check compares a password against.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAttributes<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
}

impl<'a> UserAttributes<'a> {
    pub fn new(name: &'a str, email: &'a str) -> Self {
        Self {
            name: Some(name),
            email: Some(email),
        }
    }

    fn labelled(&self) -> [(&'static str, Option<&'a str>); 2] {
        [("name", self.name), ("email address", self.email)]
    }
}

/// One password strength rule.
pub trait PasswordValidator: Send + Sync + fmt::Debug {
    /// Configuration name of the rule
    fn name(&self) -> &'static str;

    /// Check `password`; the error is the user-facing message.
    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Result<(), String>;

    /// Describes the rule to someone choosing a password
    fn help_text(&self) -> String;
}

/// Rejects passwords too close to the user's own name or email.
#[derive(Debug, Clone)]
pub struct UserAttributeSimilarityValidator {
    max_similarity: f64,
}

impl UserAttributeSimilarityValidator {
    pub fn new(max_similarity: f64) -> DomainResult<Self> {
        if max_similarity < MIN_SIMILARITY_THRESHOLD {
            return Err(DomainError::validation(format!(
                "max_similarity must be at least {}",
                MIN_SIMILARITY_THRESHOLD
            )));
        }
        Ok(Self { max_similarity })
    }

    /// A short attribute inside a much longer password can't reach the
    /// threshold, so skip the comparison.
    fn exceeds_length_ratio(&self, password: &str, value: &str) -> bool {
        let password_len = password.chars().count() as f64;
        let value_len = value.chars().count() as f64;
        let bound = self.max_similarity / 2.0 * password_len;
        password_len >= 10.0 * value_len && value_len < bound
    }
}

impl Default for UserAttributeSimilarityValidator {
    fn default() -> Self {
        Self {
            max_similarity: DEFAULT_MAX_SIMILARITY,
        }
    }
}

impl PasswordValidator for UserAttributeSimilarityValidator {
    fn name(&self) -> &'static str {
        "user_attribute_similarity"
    }

    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Result<(), String> {
        let password = password.to_lowercase();
        for (label, value) in user.labelled() {
            let Some(value) = value else { continue };
            let value = value.to_lowercase();
            let parts = NON_WORD
                .split(&value)
                .chain(std::iter::once(value.as_str()))
                .filter(|part| !part.is_empty());
            for part in parts {
                if self.exceeds_length_ratio(&password, part) {
                    continue;
                }
                if quick_ratio(&password, part) >= self.max_similarity {
                    return Err(format!("The password is too similar to the {}.", label));
                }
            }
        }
        Ok(())
    }

    fn help_text(&self) -> String {
        "Your password can't be too similar to your other personal information.".to_string()
    }
}

/// Upper bound on the similarity of two strings: twice the size of their
/// character multiset intersection over their combined length.
fn quick_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }
    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }
    2.0 * matches as f64 / total as f64
}

/// Rejects passwords shorter than `min_length` characters.
#[derive(Debug, Clone)]
pub struct MinimumLengthValidator {
    min_length: usize,
}

impl MinimumLengthValidator {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for MinimumLengthValidator {
    fn default() -> Self {
        Self::new(MIN_PASSWORD_LENGTH)
    }
}

impl PasswordValidator for MinimumLengthValidator {
    fn name(&self) -> &'static str {
        "minimum_length"
    }

    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Result<(), String> {
        if password.chars().count() < self.min_length {
            return Err(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ));
        }
        Ok(())
    }

    fn help_text(&self) -> String {
        format!(
            "Your password must contain at least {} characters.",
            self.min_length
        )
    }
}

/// Rejects passwords found in a list of commonly used passwords.
#[derive(Debug, Clone)]
pub struct CommonPasswordValidator {
    passwords: HashSet<String>,
}

impl CommonPasswordValidator {
    /// Build from any list, one password per item; comparison ignores case.
    pub fn from_list<I, S>(passwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let passwords = passwords
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty() && !p.starts_with('#'))
            .collect();
        Self { passwords }
    }

    pub fn len(&self) -> usize {
        self.passwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

impl Default for CommonPasswordValidator {
    fn default() -> Self {
        Self::from_list(COMMON_PASSWORDS.lines())
    }
}

impl PasswordValidator for CommonPasswordValidator {
    fn name(&self) -> &'static str {
        "common_password"
    }

    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Result<(), String> {
        if self.passwords.contains(&password.trim().to_lowercase()) {
            return Err("This password is too common.".to_string());
        }
        Ok(())
    }

    fn help_text(&self) -> String {
        "Your password can't be a commonly used password.".to_string()
    }
}

/// Rejects passwords made only of digits.
#[derive(Debug, Clone, Default)]
pub struct NumericPasswordValidator;

impl PasswordValidator for NumericPasswordValidator {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Result<(), String> {
        if !password.is_empty() && password.chars().all(char::is_numeric) {
            return Err("This password is entirely numeric.".to_string());
        }
        Ok(())
    }

    fn help_text(&self) -> String {
        "Your password can't be entirely numeric.".to_string()
    }
}

/// Names accepted in configuration for the built-in validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordValidatorKind {
    UserAttributeSimilarity,
    MinimumLength,
    CommonPassword,
    Numeric,
}

impl PasswordValidatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordValidatorKind::UserAttributeSimilarity => "user_attribute_similarity",
            PasswordValidatorKind::MinimumLength => "minimum_length",
            PasswordValidatorKind::CommonPassword => "common_password",
            PasswordValidatorKind::Numeric => "numeric",
        }
    }

    /// Every built-in validator, in the default application order.
    pub fn all() -> [PasswordValidatorKind; 4] {
        [
            PasswordValidatorKind::UserAttributeSimilarity,
            PasswordValidatorKind::MinimumLength,
            PasswordValidatorKind::CommonPassword,
            PasswordValidatorKind::Numeric,
        ]
    }
}

impl FromStr for PasswordValidatorKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user_attribute_similarity" => Ok(PasswordValidatorKind::UserAttributeSimilarity),
            "minimum_length" => Ok(PasswordValidatorKind::MinimumLength),
            "common_password" => Ok(PasswordValidatorKind::CommonPassword),
            "numeric" => Ok(PasswordValidatorKind::Numeric),
            other => Err(DomainError::invalid_choice("password_validator", other)),
        }
    }
}

impl fmt::Display for PasswordValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of password rules.
#[derive(Debug)]
pub struct PasswordPolicy {
    validators: Vec<Box<dyn PasswordValidator>>,
}

impl PasswordPolicy {
    pub fn new(validators: Vec<Box<dyn PasswordValidator>>) -> Self {
        Self { validators }
    }

    /// Policy that accepts every password.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Build the built-in validators named by `kinds`, keeping their order.
    pub fn from_kinds(kinds: &[PasswordValidatorKind], min_length: usize) -> Self {
        let validators = kinds
            .iter()
            .map(|kind| -> Box<dyn PasswordValidator> {
                match kind {
                    PasswordValidatorKind::UserAttributeSimilarity => {
                        Box::new(UserAttributeSimilarityValidator::default())
                    }
                    PasswordValidatorKind::MinimumLength => {
                        Box::new(MinimumLengthValidator::new(min_length))
                    }
                    PasswordValidatorKind::CommonPassword => {
                        Box::new(CommonPasswordValidator::default())
                    }
                    PasswordValidatorKind::Numeric => Box::new(NumericPasswordValidator),
                }
            })
            .collect();
        Self::new(validators)
    }

    /// Append a rule at the end of the chain.
    pub fn with(mut self, validator: impl PasswordValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Run every rule; fails with all collected messages.
    pub fn validate(&self, password: &str, user: &UserAttributes<'_>) -> DomainResult<()> {
        let errors: Vec<String> = self
            .validators
            .iter()
            .filter_map(|v| v.validate(password, user).err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Password(errors))
        }
    }

    pub fn help_texts(&self) -> Vec<String> {
        self.validators.iter().map(|v| v.help_text()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from_kinds(&PasswordValidatorKind::all(), MIN_PASSWORD_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(result: DomainResult<()>) -> Vec<String> {
        match result {
            Err(DomainError::Password(msgs)) => msgs,
            other => panic!("expected password error, got {:?}", other),
        }
    }

    #[test]
    fn default_policy_order() {
        let policy = PasswordPolicy::default();
        assert_eq!(
            policy.names(),
            vec!["user_attribute_similarity", "minimum_length", "common_password", "numeric"]
        );
    }

    #[test]
    fn accepts_strong_password() {
        let user = UserAttributes::new("Ana Souza", "ana@x.com");
        assert!(PasswordPolicy::default().validate("v3rde-Cavalo-Bateria", &user).is_ok());
    }

    #[test]
    fn collects_every_failure() {
        // short, common and numeric at once
        let result = PasswordPolicy::default().validate("123456", &UserAttributes::default());
        let msgs = messages(result);
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].contains("too short"));
        assert!(msgs[1].contains("too common"));
        assert!(msgs[2].contains("entirely numeric"));
    }

    #[test]
    fn rejects_password_similar_to_email() {
        let user = UserAttributes::new("Ana", "anasouza@x.com");
        let msgs = messages(PasswordPolicy::default().validate("anasouza1", &user));
        assert_eq!(msgs, vec!["The password is too similar to the email address.".to_string()]);
    }

    #[test]
    fn rejects_password_similar_to_name_word() {
        let user = UserAttributes::new("Mariana Oliveira", "m@x.com");
        let validator = UserAttributeSimilarityValidator::default();
        let err = validator.validate("oliveira!", &user).unwrap_err();
        assert!(err.ends_with("the name."));
    }

    #[test]
    fn similarity_skips_missing_attributes() {
        let validator = UserAttributeSimilarityValidator::default();
        assert!(validator.validate("anything", &UserAttributes::default()).is_ok());
    }

    #[test]
    fn similarity_threshold_must_be_sane() {
        assert!(UserAttributeSimilarityValidator::new(0.05).is_err());
        assert!(UserAttributeSimilarityValidator::new(0.5).is_ok());
    }

    #[test]
    fn quick_ratio_bounds() {
        assert_eq!(quick_ratio("abc", "abc"), 1.0);
        assert_eq!(quick_ratio("abc", "xyz"), 0.0);
        assert_eq!(quick_ratio("", ""), 1.0);
        assert!((quick_ratio("abcd", "ab") - 4.0 / 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn minimum_length_counts_characters() {
        let validator = MinimumLengthValidator::new(8);
        assert!(validator.validate("çççççççç", &UserAttributes::default()).is_ok());
        assert!(validator.validate("short", &UserAttributes::default()).is_err());
    }

    #[test]
    fn common_password_ignores_case() {
        let validator = CommonPasswordValidator::default();
        assert!(!validator.is_empty());
        assert!(validator.validate("PassWord", &UserAttributes::default()).is_err());
        assert!(validator.validate("senha123", &UserAttributes::default()).is_err());
    }

    #[test]
    fn common_password_custom_list_skips_comments() {
        let validator = CommonPasswordValidator::from_list(["# header", "batata", ""]);
        assert_eq!(validator.len(), 1);
        assert!(validator.validate("Batata", &UserAttributes::default()).is_err());
    }

    #[test]
    fn numeric_only_digits() {
        let validator = NumericPasswordValidator;
        assert!(validator.validate("20240101", &UserAttributes::default()).is_err());
        assert!(validator.validate("2024-01-01", &UserAttributes::default()).is_ok());
    }

    #[test]
    fn parses_validator_names() {
        assert_eq!(
            "minimum_length".parse::<PasswordValidatorKind>().unwrap(),
            PasswordValidatorKind::MinimumLength
        );
        assert!(matches!(
            "entropy".parse::<PasswordValidatorKind>(),
            Err(DomainError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn from_kinds_uses_configured_min_length() {
        let policy = PasswordPolicy::from_kinds(&[PasswordValidatorKind::MinimumLength], 12);
        assert!(policy.validate("elevenchars", &UserAttributes::default()).is_err());
        assert!(policy.validate("twelve-chars", &UserAttributes::default()).is_ok());
        assert_eq!(policy.help_texts().len(), 1);
    }

    #[test]
    fn custom_validator_appended() {
        #[derive(Debug)]
        struct NoSpaces;
        impl PasswordValidator for NoSpaces {
            fn name(&self) -> &'static str {
                "no_spaces"
            }
            fn validate(&self, password: &str, _: &UserAttributes<'_>) -> Result<(), String> {
                if password.contains(' ') {
                    Err("No spaces.".into())
                } else {
                    Ok(())
                }
            }
            fn help_text(&self) -> String {
                "No spaces.".into()
            }
        }

        let policy = PasswordPolicy::empty().with(NoSpaces);
        assert_eq!(policy.len(), 1);
        assert!(policy.validate("a b", &UserAttributes::default()).is_err());
    }
}
