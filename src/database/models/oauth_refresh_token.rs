//! `SeaORM` Entity for issued refresh tokens

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "oauth_refresh_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token_id: String,
    pub user_name: String,
    pub client_id: String,
    /// Space-separated scopes originally granted, sorted
    pub scope: String,
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
