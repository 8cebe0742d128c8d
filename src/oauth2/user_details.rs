use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};

use crate::{database::models::user_account, password::PasswordEncoder};

pub async fn load_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user_account::Model>, DbErr> {
    user_account::Entity::find_by_id(username.to_string())
        .one(db)
        .await
}

/// Loads `username` and checks `password`, returning the account only when it
/// exists, is enabled and the password matches.
pub async fn authenticate_user(
    db: &DatabaseConnection,
    encoder: &PasswordEncoder,
    username: &str,
    password: &str,
) -> Result<Option<user_account::Model>, DbErr> {
    let Some(user) = load_user_by_username(db, username).await? else {
        return Ok(None);
    };

    if !user.enabled || !encoder.matches_blocking(password, &user.password_hash).await {
        return Ok(None);
    }

    Ok(Some(user))
}

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("Failed to hash password: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub async fn create_user(
    db: &DatabaseConnection,
    encoder: &PasswordEncoder,
    username: &str,
    password: &str,
    authorities: &str,
) -> Result<user_account::Model, UserStoreError> {
    let user = user_account::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(encoder.encode(password)?),
        authorities: Set(authorities.to_string()),
        enabled: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
    }
    .insert(db)
    .await?;

    Ok(user)
}

/// Deletes the account; returns whether it existed
pub async fn remove_user(db: &DatabaseConnection, username: &str) -> Result<bool, DbErr> {
    let result = user_account::Entity::delete_by_id(username.to_string())
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::setup_test;

    #[tokio::test]
    async fn authenticates_enabled_user_with_correct_password() {
        let test = setup_test().await;

        let user = authenticate_user(&test.db, &test.password_encoder, "alice", "password")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.authority_list(), vec!["ROLE_USER"]);
    }

    #[tokio::test]
    async fn rejects_wrong_password_unknown_and_disabled_users() {
        let test = setup_test().await;
        let encoder = test.password_encoder;

        assert!(authenticate_user(&test.db, &encoder, "alice", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate_user(&test.db, &encoder, "mallory", "password")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate_user(&test.db, &encoder, "bob", "password")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn creates_and_removes_users() {
        let test = setup_test().await;
        let encoder = test.password_encoder;

        let created = create_user(&test.db, &encoder, "carol", "hunter2", "ROLE_USER,ROLE_ADMIN")
            .await
            .unwrap();
        assert_ne!(created.password_hash, "hunter2");

        assert!(authenticate_user(&test.db, &encoder, "carol", "hunter2")
            .await
            .unwrap()
            .is_some());

        assert!(remove_user(&test.db, "carol").await.unwrap());
        assert!(!remove_user(&test.db, "carol").await.unwrap());
    }
}
