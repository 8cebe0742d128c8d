//! `SeaORM` Entity for the accounts the password grant authenticates against

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    /// bcrypt encoded password
    pub password_hash: String,
    /// Comma-separated granted authorities, e.g. `ROLE_USER,ROLE_ADMIN`
    pub authorities: String,
    pub enabled: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Granted authorities as individual names, blanks dropped.
    pub fn authority_list(&self) -> Vec<String> {
        self.authorities
            .split(',')
            .map(str::trim)
            .filter(|authority| !authority.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_authorities_and_drops_blanks() {
        let user = Model {
            username: "alice".to_string(),
            password_hash: String::new(),
            authorities: "ROLE_USER, ROLE_ADMIN,,".to_string(),
            enabled: true,
            created_at: chrono::Utc::now().naive_utc(),
        };

        assert_eq!(user.authority_list(), vec!["ROLE_USER", "ROLE_ADMIN"]);
    }
}
