use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::error;

use crate::oauth2::{scope::parse_scope, OAuth2Authentication, TokenLookup, TokenServices};

/// Caller authenticated by a bearer access token.
///
/// Resolves the token through the token store and exposes the authentication
/// it was issued for. Use in handlers that require a logged in user:
///
/// ```rust,ignore
/// pub async fn handler(current_user: CurrentUser) -> Result<Json<Vec<ScheduleJob>>, ScheduleJobError> {
///     current_user.require_scope(READ_SCOPE)?;
///     println!("User: {}", current_user.user_name);
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub authentication: OAuth2Authentication,
}

impl std::ops::Deref for CurrentUser {
    type Target = OAuth2Authentication;

    fn deref(&self) -> &Self::Target {
        &self.authentication
    }
}

impl CurrentUser {
    pub fn require_scope(&self, scope: &'static str) -> Result<(), AuthError> {
        if self.authentication.scope.contains(scope) {
            Ok(())
        } else {
            Err(AuthError::InsufficientScope(scope))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Full authentication is required to access this resource")]
    Unauthorized,
    #[error("{0}")]
    InvalidToken(&'static str),
    #[error("Insufficient scope for this resource, requires: {0}")]
    InsufficientScope(&'static str),
    #[error("Internal server error")]
    DatabaseError,
}

impl AuthError {
    const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidToken(_) => "invalid_token",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::DatabaseError => "server_error",
        }
    }

    const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientScope(_) => StatusCode::FORBIDDEN,
            Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "error_description": self.to_string(),
        });

        let mut response = (status, Json(body)).into_response();

        let challenge = match &self {
            Self::Unauthorized => Some("Bearer realm=\"oauth2/resource\"".to_string()),
            Self::InvalidToken(_) | Self::InsufficientScope(_) => Some(format!(
                "Bearer realm=\"oauth2/resource\", error=\"{}\"",
                self.error_code()
            )),
            Self::DatabaseError => None,
        };
        if let Some(value) = challenge.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }

        response
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    (scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty()).then(|| token.trim())
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    DatabaseConnection: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::Unauthorized)?;

        let db = DatabaseConnection::from_ref(state);
        let lookup = TokenServices::new(db)
            .load_access_token(token)
            .await
            .map_err(|e| {
                error!("Failed to load access token: {}", e);
                AuthError::DatabaseError
            })?;

        match lookup {
            TokenLookup::NotFound => Err(AuthError::InvalidToken("Invalid access token")),
            TokenLookup::Expired => Err(AuthError::InvalidToken("Access token expired")),
            TokenLookup::Valid(stored) => Ok(Self {
                authentication: OAuth2Authentication {
                    scope: parse_scope(&stored.scope),
                    authorities: stored
                        .authorities
                        .split(',')
                        .filter(|authority| !authority.is_empty())
                        .map(str::to_string)
                        .collect(),
                    user_name: stored.user_name,
                    client_id: stored.client_id,
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/schedule_jobs");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer abc"))), Some("abc"));
    }

    #[test]
    fn ignores_other_schemes_and_missing_tokens() {
        assert_eq!(bearer_token(&parts(None)), None);
        assert_eq!(bearer_token(&parts(Some("Basic c3F1ZWV6ZXI6"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer"))), None);
    }

    #[test]
    fn scope_check() {
        let user = CurrentUser {
            authentication: OAuth2Authentication {
                user_name: "alice".to_string(),
                client_id: "squeezer".to_string(),
                scope: parse_scope("read"),
                authorities: vec!["ROLE_USER".to_string()],
            },
        };

        assert!(user.require_scope("read").is_ok());
        assert!(matches!(
            user.require_scope("write"),
            Err(AuthError::InsufficientScope("write"))
        ));
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            AuthError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("x").into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InsufficientScope("write").into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
