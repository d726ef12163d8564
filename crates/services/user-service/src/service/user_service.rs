//! User service - account use cases on top of the repository.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::{
    normalize_email, CreateUser, Password, PasswordPolicy, UpdateUser, User, UserChanges,
    UserFilter,
};

use crate::repository::UserRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register an account from a plaintext password, applying the policy
    async fn create_user(&self, input: CreateUser) -> AppResult<User>;

    /// Register an account whose credential was hashed elsewhere
    async fn create_user_with_hash(&self, input: CreateUser, password_hash: String)
        -> AppResult<User>;

    async fn get_user(&self, id: i64) -> AppResult<User>;

    async fn get_user_by_email(&self, email: &str) -> AppResult<User>;

    async fn get_user_by_cpf(&self, cpf: &str) -> AppResult<User>;

    async fn get_user_by_cnpj(&self, cnpj: &str) -> AppResult<User>;

    /// Filtered page of users plus the total number of matches
    async fn list_users(&self, filter: UserFilter) -> AppResult<(Vec<User>, u64)>;

    /// Apply a partial profile update
    async fn update_user(&self, id: i64, input: UpdateUser) -> AppResult<User>;

    /// Replace the credential after running the password policy
    async fn set_password(&self, id: i64, plain_text: &str) -> AppResult<User>;

    /// Permanently delete an account
    async fn delete_user(&self, id: i64) -> AppResult<()>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    policy: PasswordPolicy,
}

impl UserManager {
    /// Create new user service instance with repository and password policy
    pub fn new(repo: Arc<dyn UserRepository>, policy: PasswordPolicy) -> Self {
        Self { repo, policy }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        let new_user = input.into_new_user(&self.policy)?;
        let user = self.repo.create(new_user).await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    async fn create_user_with_hash(
        &self,
        input: CreateUser,
        password_hash: String,
    ) -> AppResult<User> {
        let password = Password::parse_hash(password_hash)?;
        let new_user = input.into_new_user_with_hash(password)?;
        let user = self.repo.create(new_user).await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> AppResult<User> {
        self.repo.find_by_id(id).await?.ok_or_not_found("User")
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        self.repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_not_found("User")
    }

    async fn get_user_by_cpf(&self, cpf: &str) -> AppResult<User> {
        self.repo
            .find_by_cpf(cpf.trim())
            .await?
            .ok_or_not_found("User")
    }

    async fn get_user_by_cnpj(&self, cnpj: &str) -> AppResult<User> {
        self.repo
            .find_by_cnpj(cnpj.trim())
            .await?
            .ok_or_not_found("User")
    }

    async fn list_users(&self, filter: UserFilter) -> AppResult<(Vec<User>, u64)> {
        self.repo.list(filter).await
    }

    async fn update_user(&self, id: i64, input: UpdateUser) -> AppResult<User> {
        let changes = input.into_changes()?;
        let user = self.repo.update(id, changes).await?;
        tracing::info!(user_id = user.id, "User updated");
        Ok(user)
    }

    async fn set_password(&self, id: i64, plain_text: &str) -> AppResult<User> {
        if plain_text.is_empty() {
            return Err(AppError::MissingField("password"));
        }

        let user = self.get_user(id).await?;
        let password = Password::new(plain_text, &self.policy, &user.attributes())?;
        let user = self.repo.update(id, UserChanges::password(password)).await?;
        tracing::info!(user_id = user.id, "Password changed");
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> AppResult<()> {
        self.repo.delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use domain::{timestamp_now, DomainError, UserRole};
    use mockall::predicate::eq;

    fn test_user(id: i64) -> User {
        let now = timestamp_now();
        User {
            id,
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            phone: None,
            address: None,
            role: UserRole::Client,
            cpf: None,
            cnpj: None,
            profile_photo: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn manager(repo: MockUserRepository) -> UserManager {
        UserManager::new(Arc::new(repo), PasswordPolicy::default())
    }

    fn ana_input() -> CreateUser {
        CreateUser {
            name: Some("Ana".into()),
            email: Some("ana@x.com".into()),
            password: Some("girassol-azul-77".into()),
            role: Some("cliente".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(7))
            .returning(|id| Ok(Some(test_user(id))));

        let user = manager(repo).get_user(7).await.unwrap();
        assert_eq!(user.id, 7);
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let result = manager(repo).get_user(99).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_email_normalizes_domain() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .withf(|email| email == "ana@x.com")
            .returning(|_| Ok(Some(test_user(1))));

        let user = manager(repo).get_user_by_email(" ana@X.COM ").await.unwrap();
        assert_eq!(user.email, "ana@x.com");
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .withf(|new_user| {
                new_user.name == "Ana"
                    && new_user.role == UserRole::Client
                    && new_user.password.as_str().starts_with("$argon2")
                    && new_user.password.verify("girassol-azul-77")
            })
            .times(1)
            .returning(|_| Ok(test_user(1)));

        let user = manager(repo).create_user(ana_input()).await.unwrap();
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_create_user_invalid_role_never_reaches_repository() {
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let input = CreateUser {
            role: Some("guest".into()),
            ..ana_input()
        };
        let result = manager(repo).create_user(input).await;
        assert!(matches!(
            result,
            Err(AppError::InvalidChoice { field: "role", .. })
        ));
    }

    #[tokio::test]
    async fn test_create_user_weak_password_collects_all_failures() {
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let input = CreateUser {
            password: Some("123456".into()),
            ..ana_input()
        };
        match manager(repo).create_user(input).await {
            Err(AppError::PasswordPolicy(messages)) => assert!(messages.len() >= 3),
            other => panic!("expected password policy error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_user_with_hash_rejects_plaintext() {
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let result = manager(repo)
            .create_user_with_hash(ana_input(), "not-a-hash".to_string())
            .await;
        assert!(matches!(result, Err(AppError::PasswordPolicy(_))));
    }

    #[tokio::test]
    async fn test_create_conflict_is_propagated() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .returning(|_| Err(AppError::conflict("email")));

        let result = manager(repo).create_user(ana_input()).await;
        assert!(matches!(result, Err(AppError::Conflict(field)) if field == "email"));
    }

    #[tokio::test]
    async fn test_update_user_passes_changes() {
        let mut repo = MockUserRepository::new();
        repo.expect_update()
            .withf(|id, changes| {
                *id == 3 && changes.phone == Some(Some("11 98888-7777".to_string()))
            })
            .returning(|id, _| Ok(test_user(id)));

        let input = UpdateUser {
            phone: Some(Some("11 98888-7777".into())),
            ..Default::default()
        };
        let user = manager(repo).update_user(3, input).await.unwrap();
        assert_eq!(user.id, 3);
    }

    #[tokio::test]
    async fn test_set_password_checks_similarity_to_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(test_user(id))));
        repo.expect_update().never();

        let result = manager(repo).set_password(1, "ana@x.com1").await;
        match result {
            Err(AppError::PasswordPolicy(messages)) => {
                assert_eq!(messages, vec!["The password is too similar to the email address."]);
            }
            other => panic!("expected password policy error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_password_replaces_hash() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(test_user(id))));
        repo.expect_update()
            .withf(|_, changes| {
                changes
                    .password
                    .as_ref()
                    .is_some_and(|p| p.verify("Outra-Senha-Forte-42"))
                    && changes.name.is_none()
            })
            .times(1)
            .returning(|id, _| Ok(test_user(id)));

        manager(repo)
            .set_password(1, "Outra-Senha-Forte-42")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_password_missing_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let result = manager(repo).set_password(5, "Outra-Senha-Forte-42").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete()
            .with(eq(42))
            .returning(|_| Err(AppError::not_found("User")));

        let result = manager(repo).delete_user(42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_domain_error_converts() {
        let err: AppError = DomainError::MissingField("name").into();
        assert!(matches!(err, AppError::MissingField("name")));
    }
}
