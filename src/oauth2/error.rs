use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

const CLIENT_REALM: &str = "Basic realm=\"oauth2/client\"";

/// Errors raised by the token and check-token endpoints.
///
/// Each variant maps onto an RFC 6749 error code; the message becomes
/// `error_description`.
#[derive(Debug, thiserror::Error)]
pub enum OAuth2Error {
    #[error("Full authentication is required to access this resource")]
    Unauthorized,
    #[error("{0}")]
    InvalidClient(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    InvalidGrant(String),
    #[error("{0}")]
    UnauthorizedClient(String),
    #[error("{0}")]
    UnsupportedGrantType(String),
    #[error("{0}")]
    InvalidScope(String),
    #[error("{0}")]
    InvalidToken(String),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[derive(Debug, Serialize)]
pub struct OAuth2ErrorBody {
    pub error: &'static str,
    pub error_description: String,
}

impl OAuth2Error {
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::InvalidToken(_) => "invalid_token",
            Self::Database(_) => "server_error",
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidClient(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn bad_credentials() -> Self {
        Self::InvalidGrant("Bad credentials".to_string())
    }

    pub fn bad_client_credentials() -> Self {
        Self::InvalidClient("Bad client credentials".to_string())
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_description = if let Self::Database(e) = &self {
            error!("OAuth2 endpoint database error: {}", e);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = OAuth2ErrorBody {
            error: self.error_code(),
            error_description,
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(CLIENT_REALM),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_failures_are_unauthorized_with_challenge() {
        let response = OAuth2Error::bad_client_credentials().into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            CLIENT_REALM
        );
    }

    #[test]
    fn grant_failures_are_bad_requests() {
        let response = OAuth2Error::bad_credentials().into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn codes_follow_rfc_6749() {
        assert_eq!(
            OAuth2Error::UnsupportedGrantType("x".into()).error_code(),
            "unsupported_grant_type"
        );
        assert_eq!(
            OAuth2Error::UnauthorizedClient("x".into()).error_code(),
            "unauthorized_client"
        );
        assert_eq!(OAuth2Error::InvalidScope("x".into()).error_code(), "invalid_scope");
    }
}
