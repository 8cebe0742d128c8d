use axum::{
    extract::{rejection::JsonRejection, FromRequest, OptionalFromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::{Validate, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] JsonRejection),
    #[error("Validation failed")]
    ValidationError(ValidationErrors),
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::InvalidJson(rejection) => json!({
                "error": "invalid_json",
                "message": rejection.body_text(),
            }),
            Self::ValidationError(errors) => json!({
                "error": "validation_failed",
                "message": self.to_string(),
                "fields": errors,
            }),
        };

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// JSON body extractor that runs `validator` rules before the handler sees it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = JsonError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;

        value.validate().map_err(JsonError::ValidationError)?;

        Ok(Self(value))
    }
}

/// `Option<ValidatedJson<T>>` is `None` when the request carries no
/// `Content-Type`; a body that is present is still parsed and validated.
impl<T, S> OptionalFromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = JsonError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let Some(Json(value)) =
            <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?
        else {
            return Ok(None);
        };

        value.validate().map_err(JsonError::ValidationError)?;

        Ok(Some(Self(value)))
    }
}
