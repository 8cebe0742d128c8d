use std::process;

use sea_orm::DatabaseConnection;

use crate::{
    cli::UserAction,
    config::Config,
    database::setup_database_connection,
    environment::Environment,
    oauth2::{
        user_details::{create_user, remove_user, UserStoreError},
        TokenStore,
    },
    password::PasswordEncoder,
};

pub async fn handle_user_command(environment: Environment, config: &Config, action: UserAction) {
    let db = match setup_database_connection(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("❌ Failed to connect to the database: {e}");
            process::exit(1);
        }
    };

    let encoder = PasswordEncoder::new(environment.bcrypt_cost());

    match run_user_action(&db, &encoder, action).await {
        Ok(message) => println!("{message}"),
        Err(e) => {
            eprintln!("❌ {e}");
            process::exit(1);
        }
    }
}

pub async fn run_user_action(
    db: &DatabaseConnection,
    encoder: &PasswordEncoder,
    action: UserAction,
) -> Result<String, UserStoreError> {
    match action {
        UserAction::Add {
            username,
            password,
            authorities,
        } => {
            let user = create_user(db, encoder, &username, &password, &authorities).await?;
            Ok(format!(
                "✅ Created user {} with authorities {}",
                user.username, user.authorities
            ))
        }
        UserAction::Remove { username } => {
            let revoked = TokenStore::new(db.clone())
                .remove_tokens_for_user(&username)
                .await?;

            if remove_user(db, &username).await? {
                Ok(format!("✅ Removed user {username} and {revoked} token(s)"))
            } else {
                Ok(format!("No user named {username}"))
            }
        }
    }
}
