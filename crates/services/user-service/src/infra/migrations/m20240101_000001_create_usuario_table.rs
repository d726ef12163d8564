//! Migration: Create the `usuario` account table.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use domain::{
    MAX_CNPJ_LENGTH, MAX_CPF_LENGTH, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH,
    MAX_PASSWORD_HASH_LENGTH, MAX_PHONE_LENGTH, MAX_ROLE_LENGTH, VALID_ROLES,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(Usuario::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Usuario::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Usuario::Nome).string_len(len(MAX_NAME_LENGTH)).not_null())
                    .col(
                        ColumnDef::new(Usuario::Email)
                            .string_len(len(MAX_EMAIL_LENGTH))
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Usuario::SenhaHash)
                            .string_len(len(MAX_PASSWORD_HASH_LENGTH))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Usuario::Telefone).string_len(len(MAX_PHONE_LENGTH)).null())
                    .col(ColumnDef::new(Usuario::Endereco).text().null())
                    .col(
                        ColumnDef::new(Usuario::TipoUsuario)
                            .string_len(len(MAX_ROLE_LENGTH))
                            .not_null()
                            .check(
                                Expr::col(Usuario::TipoUsuario).is_in(VALID_ROLES.iter().copied()),
                            ),
                    )
                    .col(
                        ColumnDef::new(Usuario::Cpf)
                            .string_len(len(MAX_CPF_LENGTH))
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Usuario::Cnpj)
                            .string_len(len(MAX_CNPJ_LENGTH))
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Usuario::FotoPerfil).text().null())
                    .col(timestamp(backend, Usuario::CriadoEm))
                    .col(timestamp(backend, Usuario::AtualizadoEm))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_usuario_tipo_usuario")
                    .table(Usuario::Table)
                    .col(Usuario::TipoUsuario)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Usuario::Table).to_owned())
            .await
    }
}

/// Microsecond-precision instant column. MySQL's plain TIMESTAMP drops the
/// fraction, so it gets DATETIME(6) instead.
fn timestamp(backend: DatabaseBackend, column: Usuario) -> ColumnDef {
    let mut def = ColumnDef::new(column);
    match backend {
        DatabaseBackend::MySql => def.custom(Alias::new("DATETIME(6)")),
        _ => def.timestamp_with_time_zone(),
    };
    def.not_null().to_owned()
}

fn len(max: u64) -> u32 {
    max as u32
}

#[derive(Iden)]
enum Usuario {
    Table,
    Id,
    Nome,
    Email,
    SenhaHash,
    Telefone,
    Endereco,
    TipoUsuario,
    Cpf,
    Cnpj,
    FotoPerfil,
    CriadoEm,
    AtualizadoEm,
}
