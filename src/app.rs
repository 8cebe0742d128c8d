use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{
    amqp::Producer, config::Config, environment::Environment, oauth2::ClientRegistry,
    password::PasswordEncoder,
};

/// Shared request state.
#[derive(Clone, Debug)]
pub struct App {
    pub config: Config,
    pub environment: Environment,
    pub db: DatabaseConnection,
    pub producer: Producer,
    pub clients: Arc<ClientRegistry>,
    pub password_encoder: PasswordEncoder,
}

impl FromRef<App> for DatabaseConnection {
    fn from_ref(app: &App) -> Self {
        app.db.clone()
    }
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Database connection error")]
    DatabaseError(#[from] sea_orm::DbErr),
}

impl IntoResponse for ReadinessError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}
