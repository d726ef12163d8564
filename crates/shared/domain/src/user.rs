//! User account entity and related types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidateEmail, ValidationErrors};

use crate::constants::{
    MAX_CNPJ_LENGTH, MAX_CPF_LENGTH, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PHONE_LENGTH,
    ROLE_ADMIN, ROLE_CLIENT, ROLE_PROVIDER,
};
use crate::error::{DomainError, DomainResult};
use crate::password::Password;
use crate::password_validation::{PasswordPolicy, UserAttributes};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "cliente")]
    Client,
    #[serde(rename = "prestador")]
    Provider,
    #[serde(rename = "admin")]
    Admin,
}

impl UserRole {
    /// Stored value of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => ROLE_CLIENT,
            UserRole::Provider => ROLE_PROVIDER,
            UserRole::Admin => ROLE_ADMIN,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn all() -> [UserRole; 3] {
        [UserRole::Client, UserRole::Provider, UserRole::Admin]
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_CLIENT => Ok(UserRole::Client),
            ROLE_PROVIDER => Ok(UserRole::Provider),
            ROLE_ADMIN => Ok(UserRole::Admin),
            other => Err(DomainError::invalid_choice("role", other)),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current instant at storage precision (microseconds).
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Instant to record for a modification of a row last touched at `previous`.
///
/// Never returns a value at or before `previous`, even if the clock did not
/// move or went backwards.
pub fn next_modification(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = timestamp_now();
    if now > previous {
        now
    } else {
        previous.trunc_subsecs(6) + Duration::microseconds(1)
    }
}

/// Lowercase the domain part of an email; the local part is kept as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// User account entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fields the password similarity check looks at
    pub fn attributes(&self) -> UserAttributes<'_> {
        UserAttributes::new(&self.name, &self.email)
    }

    pub fn password(&self) -> Password {
        Password::from_hash(self.password_hash.clone())
    }

    pub fn verify_password(&self, plain_text: &str) -> bool {
        self.password().verify(plain_text)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validated row ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: Password,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub profile_photo: Option<String>,
}

impl NewUser {
    pub fn attributes(&self) -> UserAttributes<'_> {
        UserAttributes::new(&self.name, &self.email)
    }
}

/// User creation data transfer object
///
/// Length limits mirror the column constants in [`crate::constants`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 254, message = "Email must be at most 254 characters")
    )]
    pub email: Option<String>,
    /// Plaintext; hashed before it leaves the domain
    pub password: Option<String>,
    pub role: Option<String>,
    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 14, message = "CPF must be at most 14 characters"))]
    pub cpf: Option<String>,
    #[validate(length(max = 18, message = "CNPJ must be at most 18 characters"))]
    pub cnpj: Option<String>,
    pub profile_photo: Option<String>,
}

impl CreateUser {
    /// Validate the draft and hash its plaintext password under `policy`.
    pub fn into_new_user(self, policy: &PasswordPolicy) -> DomainResult<NewUser> {
        let (profile, plain) = self.into_profile()?;
        let plain = plain.ok_or(DomainError::MissingField("password"))?;
        let password = Password::new(&plain, policy, &profile.attributes())?;
        Ok(profile.with_password(password))
    }

    /// Validate the draft and attach an already hashed credential.
    ///
    /// The plaintext `password` field, if any, is ignored.
    pub fn into_new_user_with_hash(self, password: Password) -> DomainResult<NewUser> {
        let (profile, _) = self.into_profile()?;
        Ok(profile.with_password(password))
    }

    fn into_profile(self) -> DomainResult<(Profile, Option<String>)> {
        let draft = CreateUser {
            name: self.name.as_deref().and_then(non_blank),
            email: self
                .email
                .as_deref()
                .and_then(non_blank)
                .map(|e| normalize_email(&e)),
            password: self.password.filter(|p| !p.is_empty()),
            role: self.role.as_deref().and_then(non_blank),
            phone: self.phone.as_deref().and_then(non_blank),
            address: self.address.as_deref().and_then(non_blank),
            cpf: self.cpf.as_deref().and_then(non_blank),
            cnpj: self.cnpj.as_deref().and_then(non_blank),
            profile_photo: self.profile_photo.as_deref().and_then(non_blank),
        };

        let name = draft.name.clone().ok_or(DomainError::MissingField("name"))?;
        let email = draft.email.clone().ok_or(DomainError::MissingField("email"))?;
        let role = draft
            .role
            .as_deref()
            .ok_or(DomainError::MissingField("role"))?
            .parse::<UserRole>()?;

        draft
            .validate()
            .map_err(|e| DomainError::Validation(validation_message(&e)))?;

        let profile = Profile {
            name,
            email,
            role,
            phone: draft.phone,
            address: draft.address,
            cpf: draft.cpf,
            cnpj: draft.cnpj,
            profile_photo: draft.profile_photo,
        };
        Ok((profile, draft.password))
    }
}

struct Profile {
    name: String,
    email: String,
    role: UserRole,
    phone: Option<String>,
    address: Option<String>,
    cpf: Option<String>,
    cnpj: Option<String>,
    profile_photo: Option<String>,
}

impl Profile {
    fn attributes(&self) -> UserAttributes<'_> {
        UserAttributes::new(&self.name, &self.email)
    }

    fn with_password(self, password: Password) -> NewUser {
        NewUser {
            name: self.name,
            email: self.email,
            password,
            role: self.role,
            phone: self.phone,
            address: self.address,
            cpf: self.cpf,
            cnpj: self.cnpj,
            profile_photo: self.profile_photo,
        }
    }
}

/// Partial update data transfer object.
///
/// Every field is `Option<Option<_>>` so an explicit `null` is seen: absent
/// leaves the column alone, `null` clears a nullable column and is a
/// missing-field error for a required one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub cpf: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub cnpj: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub profile_photo: Option<Option<String>>,
}

/// Marks a field that appeared in the payload, even as `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl UpdateUser {
    /// Validate and normalize the patch.
    pub fn into_changes(self) -> DomainResult<UserChanges> {
        let name = match self.name {
            Some(name) => {
                let name = name
                    .as_deref()
                    .and_then(non_blank)
                    .ok_or(DomainError::MissingField("name"))?;
                check_length("Name", &name, MAX_NAME_LENGTH)?;
                Some(name)
            }
            None => None,
        };

        let email = match self.email {
            Some(email) => {
                let email = email
                    .as_deref()
                    .and_then(non_blank)
                    .map(|e| normalize_email(&e))
                    .ok_or(DomainError::MissingField("email"))?;
                check_length("Email", &email, MAX_EMAIL_LENGTH)?;
                if !email.validate_email() {
                    return Err(DomainError::validation("Enter a valid email address"));
                }
                Some(email)
            }
            None => None,
        };

        let role = match self.role {
            Some(Some(role)) => Some(role.trim().parse::<UserRole>()?),
            Some(None) => return Err(DomainError::MissingField("role")),
            None => None,
        };

        Ok(UserChanges {
            name,
            email,
            role,
            phone: nullable(self.phone, "Phone", Some(MAX_PHONE_LENGTH))?,
            address: nullable(self.address, "Address", None)?,
            cpf: nullable(self.cpf, "CPF", Some(MAX_CPF_LENGTH))?,
            cnpj: nullable(self.cnpj, "CNPJ", Some(MAX_CNPJ_LENGTH))?,
            profile_photo: nullable(self.profile_photo, "Profile photo", None)?,
            password: None,
        })
    }
}

/// Validated set of column changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub cpf: Option<Option<String>>,
    pub cnpj: Option<Option<String>>,
    pub profile_photo: Option<Option<String>>,
    pub password: Option<Password>,
}

impl UserChanges {
    /// Change set that only replaces the credential
    pub fn password(password: Password) -> Self {
        Self {
            password: Some(password),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Filter for listing users
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    pub offset: u64,
    /// Zero means no limit
    pub limit: u64,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            role: user.role,
            cpf: user.cpf,
            cnpj: user.cnpj,
            profile_photo: user.profile_photo,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn check_length(label: &str, value: &str, max: u64) -> DomainResult<()> {
    if value.chars().count() as u64 > max {
        return Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            label, max
        )));
    }
    Ok(())
}

/// Blank values clear the column, the same as `null`.
fn nullable(
    value: Option<Option<String>>,
    label: &str,
    max: Option<u64>,
) -> DomainResult<Option<Option<String>>> {
    let Some(value) = value else { return Ok(None) };
    let value = value.as_deref().and_then(non_blank);
    if let (Some(v), Some(max)) = (value.as_deref(), max) {
        check_length(label, v, max)?;
    }
    Ok(Some(value))
}

/// Flatten validator output into one stable message.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let by_field: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();

    by_field.into_values().flatten().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> CreateUser {
        CreateUser {
            name: Some("Ana".into()),
            email: Some("ana@x.com".into()),
            password: Some("girassol-azul-77".into()),
            role: Some("cliente".into()),
            ..Default::default()
        }
    }

    #[test]
    fn role_round_trips_stored_values() {
        for role in UserRole::all() {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert_eq!(UserRole::Provider.to_string(), "prestador");
        assert_eq!(serde_json::to_string(&UserRole::Client).unwrap(), "\"cliente\"");
    }

    #[test]
    fn unknown_role_is_invalid_choice() {
        let err = "guest".parse::<UserRole>().unwrap_err();
        assert_eq!(err, DomainError::invalid_choice("role", "guest"));
    }

    #[test]
    fn create_minimal_user() {
        let new_user = ana().into_new_user(&PasswordPolicy::default()).unwrap();
        assert_eq!(new_user.name, "Ana");
        assert_eq!(new_user.role, UserRole::Client);
        assert!(new_user.phone.is_none());
        assert!(new_user.cpf.is_none() && new_user.cnpj.is_none());
        assert!(new_user.password.verify("girassol-azul-77"));
    }

    #[test]
    fn create_rejects_guest_role() {
        let draft = CreateUser {
            role: Some("guest".into()),
            ..ana()
        };
        let err = draft.into_new_user(&PasswordPolicy::default()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidChoice { field: "role", .. }));
    }

    #[test]
    fn create_reports_missing_required_fields() {
        let cases: [(CreateUser, &str); 4] = [
            (CreateUser { name: Some("   ".into()), ..ana() }, "name"),
            (CreateUser { email: None, ..ana() }, "email"),
            (CreateUser { role: None, ..ana() }, "role"),
            (CreateUser { password: Some(String::new()), ..ana() }, "password"),
        ];
        for (draft, field) in cases {
            let err = draft.into_new_user(&PasswordPolicy::default()).unwrap_err();
            assert_eq!(err, DomainError::MissingField(field));
        }
    }

    #[test]
    fn create_validates_email_shape_and_lengths() {
        let bad_email = CreateUser {
            email: Some("not-an-email".into()),
            ..ana()
        };
        assert!(matches!(
            bad_email.into_new_user(&PasswordPolicy::empty()),
            Err(DomainError::Validation(_))
        ));

        let long_cpf = CreateUser {
            cpf: Some("123.456.789-000".into()),
            ..ana()
        };
        let err = long_cpf.into_new_user(&PasswordPolicy::empty()).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("CPF must be at most 14 characters".into())
        );
    }

    #[test]
    fn create_normalizes_optional_and_email() {
        let draft = CreateUser {
            email: Some("  Ana@X.COM ".into()),
            phone: Some("  ".into()),
            cnpj: Some(" 12.345.678/0001-90 ".into()),
            ..ana()
        };
        let new_user = draft.into_new_user(&PasswordPolicy::empty()).unwrap();
        assert_eq!(new_user.email, "Ana@x.com");
        assert_eq!(new_user.phone, None);
        assert_eq!(new_user.cnpj.as_deref(), Some("12.345.678/0001-90"));
    }

    #[test]
    fn create_applies_password_policy_with_user_attributes() {
        let draft = CreateUser {
            email: Some("girassol@x.com".into()),
            password: Some("girassol1".into()),
            ..ana()
        };
        let err = draft.into_new_user(&PasswordPolicy::default()).unwrap_err();
        assert!(matches!(err, DomainError::Password(ref msgs) if msgs.len() == 1));
    }

    #[test]
    fn create_with_hash_skips_plaintext() {
        let hash = Password::new(
            "whatever-it-is",
            &PasswordPolicy::empty(),
            &UserAttributes::default(),
        )
        .unwrap();
        let draft = CreateUser {
            password: None,
            ..ana()
        };
        let new_user = draft.into_new_user_with_hash(hash.clone()).unwrap();
        assert_eq!(new_user.password, hash);
    }

    #[test]
    fn update_distinguishes_absent_and_null() {
        let patch: UpdateUser =
            serde_json::from_str(r#"{"phone": "11 99999-0000", "cpf": null}"#).unwrap();
        let changes = patch.into_changes().unwrap();
        assert_eq!(changes.phone, Some(Some("11 99999-0000".into())));
        assert_eq!(changes.cpf, Some(None));
        assert_eq!(changes.cnpj, None);
        assert_eq!(changes.name, None);
    }

    #[test]
    fn update_rejects_blank_required_and_bad_role() {
        let blank = UpdateUser {
            name: Some(Some(" ".into())),
            ..Default::default()
        };
        assert_eq!(blank.into_changes().unwrap_err(), DomainError::MissingField("name"));

        let bad_role = UpdateUser {
            role: Some(Some("guest".into())),
            ..Default::default()
        };
        assert!(matches!(
            bad_role.into_changes(),
            Err(DomainError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn update_rejects_null_required_fields() {
        for (body, field) in [
            (r#"{"name": null}"#, "name"),
            (r#"{"email": null}"#, "email"),
            (r#"{"role": null}"#, "role"),
        ] {
            let patch: UpdateUser = serde_json::from_str(body).unwrap();
            assert_eq!(patch.into_changes().unwrap_err(), DomainError::MissingField(field));
        }

        let patch: UpdateUser = serde_json::from_str(r#"{"phone": null}"#).unwrap();
        assert_eq!(patch.into_changes().unwrap().phone, Some(None));
    }

    #[test]
    fn update_validates_email() {
        let patch = UpdateUser {
            email: Some(Some("nope".into())),
            ..Default::default()
        };
        assert!(matches!(patch.into_changes(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn empty_changes() {
        assert!(UpdateUser::default().into_changes().unwrap().is_empty());
        let hash = Password::from_hash("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into());
        assert!(!UserChanges::password(hash).is_empty());
    }

    #[test]
    fn next_modification_strictly_advances() {
        let future = Utc::now() + Duration::seconds(60);
        let next = next_modification(future);
        assert!(next > future);

        let past = Utc::now() - Duration::seconds(60);
        assert!(next_modification(past) > past);
    }

    #[test]
    fn timestamps_have_microsecond_precision() {
        let now = timestamp_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn response_hides_hash_and_display_is_name() {
        let now = timestamp_now();
        let user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            phone: None,
            address: None,
            role: UserRole::Client,
            cpf: None,
            cnpj: None,
            profile_photo: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(user.to_string(), "Ana");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(json.contains("\"role\":\"cliente\""));
    }
}
