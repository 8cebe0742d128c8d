//! `SeaORM` Entity for issued access tokens

use sea_orm::entity::prelude::*;

/// An issued access token and the authentication it carries.
///
/// Only the SHA-256 digest of the token value is stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "oauth_access_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token_id: String,
    /// Digest of (user name, client id, scope); at most one live token per key
    #[sea_orm(unique)]
    pub authentication_id: String,
    pub user_name: String,
    pub client_id: String,
    /// Space-separated granted scopes, sorted
    pub scope: String,
    /// Comma-separated authorities of the user at issuance
    pub authorities: String,
    /// Digest of the refresh token this access token was issued with
    pub refresh_token_id: Option<String>,
    pub expires_at: DateTime,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().naive_utc() >= self.expires_at
    }
}
