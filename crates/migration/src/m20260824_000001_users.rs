use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).binary().not_null())
                    .col(ColumnDef::new(Users::Salt).binary().not_null())
                    .col(
                        ColumnDef::new(Users::PasswordIterations)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Users::ApiKeyId).string().not_null())
                    .col(ColumnDef::new(Users::ApiCode).string().not_null())
                    .col(
                        ColumnDef::new(Users::Active)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::ActivationCode).string().not_null())
                    .col(ColumnDef::new(Users::ActivatedAt).big_integer())
                    .col(ColumnDef::new(Users::RecoveryCode).string())
                    .col(ColumnDef::new(Users::RecoverySentAt).big_integer())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Email is the lookup key and must be unique; duplicate registration
        // under race resolves here.
        manager
            .create_index(
                Index::create()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let _ = manager
            .drop_index(Index::drop().name("idx_users_email").to_owned())
            .await;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Salt,
    PasswordIterations,
    ApiKeyId,
    ApiCode,
    Active,
    ActivationCode,
    ActivatedAt,
    RecoveryCode,
    RecoverySentAt,
    CreatedAt,
    UpdatedAt,
}
