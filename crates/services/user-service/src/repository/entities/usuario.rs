//! Account table entity for SeaORM.
//!
//! Field names are English; the persisted column names are kept as
//! `column_name` attributes.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "usuario")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "nome")]
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(column_name = "senha_hash")]
    pub password_hash: String,
    #[sea_orm(column_name = "telefone")]
    pub phone: Option<String>,
    #[sea_orm(column_name = "endereco", column_type = "Text", nullable)]
    pub address: Option<String>,
    #[sea_orm(column_name = "tipo_usuario")]
    pub role: String,
    #[sea_orm(unique)]
    pub cpf: Option<String>,
    #[sea_orm(unique)]
    pub cnpj: Option<String>,
    #[sea_orm(column_name = "foto_perfil", column_type = "Text", nullable)]
    pub profile_photo: Option<String>,
    #[sea_orm(column_name = "criado_em")]
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "atualizado_em")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert a stored row to the domain entity.
///
/// Fails only if the row carries a role outside the enumerated set, which
/// the table's CHECK constraint should have prevented.
impl TryFrom<Model> for User {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role: UserRole = model.role.parse().map_err(|_| {
            AppError::internal(format!(
                "user {} has unknown role '{}'",
                model.id, model.role
            ))
        })?;

        Ok(User {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            phone: model.phone,
            address: model.address,
            role,
            cpf: model.cpf,
            cnpj: model.cnpj,
            profile_photo: model.profile_photo,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
