use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};

use crate::{
    database::models::{oauth_access_token, oauth_refresh_token},
    oauth2::{
        authentication::{digest, OAuth2Authentication},
        scope::format_scope,
    },
};

/// Relational token store.
///
/// Token values never reach the database; rows are keyed by their SHA-256
/// digest (`token_id`).
///
/// Works over a plain connection or, via [`TokenStore::begin`], a transaction.
#[derive(Debug, Clone)]
pub struct TokenStore<C = DatabaseConnection> {
    db: C,
}

impl TokenStore {
    /// Storage key for a token value
    #[must_use]
    pub fn extract_token_key(value: &str) -> String {
        digest(value)
    }

    /// Starts a transaction; the returned store writes through it until
    /// [`TokenStore::commit`]. Dropping it uncommitted rolls everything back.
    pub async fn begin(&self) -> Result<TokenStore<DatabaseTransaction>, DbErr> {
        Ok(TokenStore::new(self.db.begin().await?))
    }
}

impl TokenStore<DatabaseTransaction> {
    pub async fn commit(self) -> Result<(), DbErr> {
        self.db.commit().await
    }
}

impl<C: ConnectionTrait> TokenStore<C> {
    #[must_use]
    pub const fn new(db: C) -> Self {
        Self { db }
    }

    pub async fn store_access_token(
        &self,
        token: &str,
        authentication: &OAuth2Authentication,
        refresh_token: Option<&str>,
        expires_at: NaiveDateTime,
    ) -> Result<(), DbErr> {
        oauth_access_token::ActiveModel {
            token_id: Set(TokenStore::extract_token_key(token)),
            authentication_id: Set(authentication.authentication_key()),
            user_name: Set(authentication.user_name.clone()),
            client_id: Set(authentication.client_id.clone()),
            scope: Set(format_scope(&authentication.scope)),
            authorities: Set(authentication.authorities.join(",")),
            refresh_token_id: Set(refresh_token.map(TokenStore::extract_token_key)),
            expires_at: Set(expires_at),
            created_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }

    pub async fn read_access_token(
        &self,
        token: &str,
    ) -> Result<Option<oauth_access_token::Model>, DbErr> {
        oauth_access_token::Entity::find_by_id(TokenStore::extract_token_key(token))
            .one(&self.db)
            .await
    }

    /// The live access token for an authentication, if one was issued
    pub async fn get_access_token(
        &self,
        authentication: &OAuth2Authentication,
    ) -> Result<Option<oauth_access_token::Model>, DbErr> {
        oauth_access_token::Entity::find()
            .filter(
                oauth_access_token::Column::AuthenticationId
                    .eq(authentication.authentication_key()),
            )
            .one(&self.db)
            .await
    }

    pub async fn remove_access_token(&self, token_id: &str) -> Result<(), DbErr> {
        oauth_access_token::Entity::delete_by_id(token_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn remove_access_token_using_refresh_token(
        &self,
        refresh_token_id: &str,
    ) -> Result<(), DbErr> {
        oauth_access_token::Entity::delete_many()
            .filter(oauth_access_token::Column::RefreshTokenId.eq(refresh_token_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn store_refresh_token(
        &self,
        token: &str,
        authentication: &OAuth2Authentication,
        expires_at: NaiveDateTime,
    ) -> Result<(), DbErr> {
        oauth_refresh_token::ActiveModel {
            token_id: Set(TokenStore::extract_token_key(token)),
            user_name: Set(authentication.user_name.clone()),
            client_id: Set(authentication.client_id.clone()),
            scope: Set(format_scope(&authentication.scope)),
            expires_at: Set(expires_at),
            created_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }

    pub async fn read_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<oauth_refresh_token::Model>, DbErr> {
        oauth_refresh_token::Entity::find_by_id(TokenStore::extract_token_key(token))
            .one(&self.db)
            .await
    }

    pub async fn remove_refresh_token(&self, token_id: &str) -> Result<(), DbErr> {
        oauth_refresh_token::Entity::delete_by_id(token_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Drops every access and refresh token issued to `user_name`
    pub async fn remove_tokens_for_user(&self, user_name: &str) -> Result<u64, DbErr> {
        let access = oauth_access_token::Entity::delete_many()
            .filter(oauth_access_token::Column::UserName.eq(user_name))
            .exec(&self.db)
            .await?;

        let refresh = oauth_refresh_token::Entity::delete_many()
            .filter(oauth_refresh_token::Column::UserName.eq(user_name))
            .exec(&self.db)
            .await?;

        Ok(access.rows_affected + refresh.rows_affected)
    }
}
