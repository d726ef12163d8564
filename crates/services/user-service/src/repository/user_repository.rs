//! Account repository backed by SeaORM.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::entities::usuario::{self, ActiveModel, Entity as UsuarioEntity};
use common::{AppError, AppResult, OptionExt};
use domain::{next_modification, timestamp_now, NewUser, User, UserChanges, UserFilter};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Stand-in for "no limit" when only an offset is requested.
const UNBOUNDED_LIMIT: u64 = i64::MAX as u64;

/// Account repository trait for dependency injection.
///
/// Uniqueness of email, cpf and cnpj is left to the table's unique indexes;
/// a collision surfaces as [`AppError::Conflict`] naming the column.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find user by exact email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by individual tax ID
    async fn find_by_cpf(&self, cpf: &str) -> AppResult<Option<User>>;

    /// Find user by organization tax ID
    async fn find_by_cnpj(&self, cnpj: &str) -> AppResult<Option<User>>;

    /// Insert a new row; both timestamps get the same instant
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Apply changes and refresh `updated_at`
    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<User>;

    /// One page of matching users ordered by ID, plus the total match count
    async fn list(&self, filter: UserFilter) -> AppResult<(Vec<User>, u64)>;

    /// Permanently delete user
    async fn delete(&self, id: i64) -> AppResult<()>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_one(&self, condition: Condition) -> AppResult<Option<User>> {
        UsuarioEntity::find()
            .filter(condition)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        UsuarioEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one(Condition::all().add(usuario::Column::Email.eq(email)))
            .await
    }

    async fn find_by_cpf(&self, cpf: &str) -> AppResult<Option<User>> {
        self.find_one(Condition::all().add(usuario::Column::Cpf.eq(cpf)))
            .await
    }

    async fn find_by_cnpj(&self, cnpj: &str) -> AppResult<Option<User>> {
        self.find_one(Condition::all().add(usuario::Column::Cnpj.eq(cnpj)))
            .await
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let now = timestamp_now();
        let active_model = ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password.into_string()),
            phone: Set(user.phone),
            address: Set(user.address),
            role: Set(user.role.to_string()),
            cpf: Set(user.cpf),
            cnpj: Set(user.cnpj),
            profile_photo: Set(user.profile_photo),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        tracing::debug!(user_id = model.id, "Inserted user");
        User::try_from(model)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<User> {
        let model = UsuarioEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("User")?;

        let updated_at = next_modification(model.updated_at);
        let mut active: ActiveModel = model.into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(role) = changes.role {
            active.role = Set(role.to_string());
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(phone);
        }
        if let Some(address) = changes.address {
            active.address = Set(address);
        }
        if let Some(cpf) = changes.cpf {
            active.cpf = Set(cpf);
        }
        if let Some(cnpj) = changes.cnpj {
            active.cnpj = Set(cnpj);
        }
        if let Some(photo) = changes.profile_photo {
            active.profile_photo = Set(photo);
        }
        if let Some(password) = changes.password {
            active.password_hash = Set(password.into_string());
        }
        active.updated_at = Set(updated_at);

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        User::try_from(model)
    }

    async fn list(&self, filter: UserFilter) -> AppResult<(Vec<User>, u64)> {
        let mut condition = Condition::all();
        if let Some(role) = filter.role {
            condition = condition.add(usuario::Column::Role.eq(role.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(usuario::Column::Name.contains(search))
                    .add(usuario::Column::Email.contains(search)),
            );
        }

        let query = UsuarioEntity::find().filter(condition);
        let total = query.clone().count(&self.db).await?;

        // OFFSET is only valid after a LIMIT on SQLite and MySQL.
        let limit = match (filter.limit, filter.offset) {
            (0, 0) => None,
            (0, _) => Some(UNBOUNDED_LIMIT),
            (limit, _) => Some(limit),
        };
        let models = query
            .order_by_asc(usuario::Column::Id)
            .limit(limit)
            .offset((filter.offset > 0).then_some(filter.offset))
            .all(&self.db)
            .await?;

        let users = models
            .into_iter()
            .map(User::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((users, total))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = UsuarioEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("User"));
        }

        Ok(())
    }
}
