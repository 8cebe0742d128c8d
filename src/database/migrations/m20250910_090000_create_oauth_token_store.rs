use sea_orm_migration::{
    prelude::*,
    schema::{string, string_null, timestamp},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OauthRefreshToken::Table)
                    .if_not_exists()
                    .col(string(OauthRefreshToken::TokenId).primary_key())
                    .col(string(OauthRefreshToken::UserName))
                    .col(string(OauthRefreshToken::ClientId))
                    .col(string(OauthRefreshToken::Scope))
                    .col(timestamp(OauthRefreshToken::ExpiresAt))
                    .col(
                        timestamp(OauthRefreshToken::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OauthAccessToken::Table)
                    .if_not_exists()
                    .col(string(OauthAccessToken::TokenId).primary_key())
                    .col(string(OauthAccessToken::AuthenticationId))
                    .col(string(OauthAccessToken::UserName))
                    .col(string(OauthAccessToken::ClientId))
                    .col(string(OauthAccessToken::Scope))
                    .col(string(OauthAccessToken::Authorities))
                    .col(string_null(OauthAccessToken::RefreshTokenId))
                    .col(timestamp(OauthAccessToken::ExpiresAt))
                    .col(
                        timestamp(OauthAccessToken::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-oauth_access_token-authentication_id")
                    .table(OauthAccessToken::Table)
                    .col(OauthAccessToken::AuthenticationId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-oauth_access_token-refresh_token_id")
                    .table(OauthAccessToken::Table)
                    .col(OauthAccessToken::RefreshTokenId)
                    .to_owned(),
            )
            .await?;

        // Lookups when a user account is removed
        manager
            .create_index(
                Index::create()
                    .name("idx-oauth_refresh_token-user_name")
                    .table(OauthRefreshToken::Table)
                    .col(OauthRefreshToken::UserName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OauthAccessToken::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(OauthRefreshToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OauthAccessToken {
    Table,
    TokenId,
    AuthenticationId,
    UserName,
    ClientId,
    Scope,
    Authorities,
    RefreshTokenId,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OauthRefreshToken {
    Table,
    TokenId,
    UserName,
    ClientId,
    Scope,
    ExpiresAt,
    CreatedAt,
}
