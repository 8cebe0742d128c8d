use sea_orm_migration::{
    prelude::*,
    schema::{boolean, string, timestamp},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserAccount::Table)
                    .if_not_exists()
                    .col(string(UserAccount::Username).primary_key())
                    .col(string(UserAccount::PasswordHash))
                    .col(string(UserAccount::Authorities).default("ROLE_USER"))
                    .col(boolean(UserAccount::Enabled).default(true))
                    .col(timestamp(UserAccount::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserAccount::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserAccount {
    Table,
    Username,
    PasswordHash,
    Authorities,
    Enabled,
    CreatedAt,
}
