use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use validator::Validate;

use crate::{
    amqp::PublishError,
    api::{
        unique_constraint::{handle_unique_constraint_violation, UniqueConstraintError},
        validated_json::ValidatedJson,
    },
    app::App,
    auth::{AuthError, CurrentUser, READ_SCOPE, WRITE_SCOPE},
    database::models::schedule_job::{self, ScheduleJob},
};

pub fn router() -> Router<App> {
    Router::new()
        .route("/schedule_jobs", get(index).post(create))
        .route(
            "/schedule_jobs/{job_id}",
            get(show).put(update).delete(destroy),
        )
        .route("/schedule_jobs/{job_id}/publish", post(publish))
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleJobError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Schedule job {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Uniqueness(UniqueConstraintError),
    #[error("Failed to publish schedule job: {0}")]
    Publish(#[from] PublishError),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UniqueConstraintError> for ScheduleJobError {
    fn from(error: UniqueConstraintError) -> Self {
        match error {
            UniqueConstraintError::Other(db_err) => Self::Database(db_err),
            uniqueness @ UniqueConstraintError::UniquenessError(_) => Self::Uniqueness(uniqueness),
        }
    }
}

impl IntoResponse for ScheduleJobError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, code, message) = match self {
            Self::Auth(auth) => return auth.into_response(),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", message),
            Self::Uniqueness(_) => (StatusCode::CONFLICT, "conflict", message),
            Self::Publish(e) => {
                error!("Broker publish failed: {}", e);
                (StatusCode::BAD_GATEWAY, "publish_failed", message)
            }
            Self::Database(e) => {
                error!("Schedule job database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": code,
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Writable attributes of a schedule job.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleJobFields {
    #[validate(length(max = 255))]
    pub job_name: Option<String>,
    #[validate(length(max = 255))]
    pub job_group: Option<String>,
    #[validate(length(max = 255))]
    pub job_status: Option<String>,
    #[validate(length(max = 255))]
    pub cron_expression: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub interface_name: Option<String>,
}

impl ScheduleJobFields {
    fn into_active_model(self, job_id: i64) -> schedule_job::ActiveModel {
        schedule_job::ActiveModel {
            job_id: Set(job_id),
            job_name: Set(self.job_name),
            job_group: Set(self.job_group),
            job_status: Set(self.job_status),
            cron_expression: Set(self.cron_expression),
            description: Set(self.description),
            interface_name: Set(self.interface_name),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleJob {
    pub job_id: i64,
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: ScheduleJobFields,
}

/// Destination override for a publish; both fall back to configuration.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishParams {
    #[validate(length(max = 255))]
    pub exchange: Option<String>,
    #[validate(length(max = 255))]
    pub routing_key: Option<String>,
}

async fn find_job(app: &App, job_id: i64) -> Result<ScheduleJob, ScheduleJobError> {
    schedule_job::Entity::find_by_id(job_id)
        .one(&app.db)
        .await?
        .ok_or(ScheduleJobError::NotFound(job_id))
}

pub async fn index(
    current_user: CurrentUser,
    State(app): State<App>,
) -> Result<Json<Vec<ScheduleJob>>, ScheduleJobError> {
    current_user.require_scope(READ_SCOPE)?;

    let jobs = schedule_job::Entity::find()
        .order_by_asc(schedule_job::Column::JobId)
        .all(&app.db)
        .await?;

    Ok(Json(jobs))
}

pub async fn show(
    current_user: CurrentUser,
    State(app): State<App>,
    Path(job_id): Path<i64>,
) -> Result<Json<ScheduleJob>, ScheduleJobError> {
    current_user.require_scope(READ_SCOPE)?;

    Ok(Json(find_job(&app, job_id).await?))
}

pub async fn create(
    current_user: CurrentUser,
    State(app): State<App>,
    ValidatedJson(params): ValidatedJson<CreateScheduleJob>,
) -> Result<(StatusCode, Json<ScheduleJob>), ScheduleJobError> {
    current_user.require_scope(WRITE_SCOPE)?;

    if schedule_job::Entity::find_by_id(params.job_id)
        .one(&app.db)
        .await?
        .is_some()
    {
        return Err(ScheduleJobError::Uniqueness(
            UniqueConstraintError::UniquenessError("jobId"),
        ));
    }

    let job = params
        .fields
        .into_active_model(params.job_id)
        .insert(&app.db)
        .await
        .map_err(handle_unique_constraint_violation("jobId"))?;

    info!("User {} created schedule job {}", current_user.user_name, job.job_id);

    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update(
    current_user: CurrentUser,
    State(app): State<App>,
    Path(job_id): Path<i64>,
    ValidatedJson(fields): ValidatedJson<ScheduleJobFields>,
) -> Result<Json<ScheduleJob>, ScheduleJobError> {
    current_user.require_scope(WRITE_SCOPE)?;

    find_job(&app, job_id).await?;

    let job = fields.into_active_model(job_id).update(&app.db).await?;

    Ok(Json(job))
}

pub async fn destroy(
    current_user: CurrentUser,
    State(app): State<App>,
    Path(job_id): Path<i64>,
) -> Result<StatusCode, ScheduleJobError> {
    current_user.require_scope(WRITE_SCOPE)?;

    let result = schedule_job::Entity::delete_by_id(job_id)
        .exec(&app.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ScheduleJobError::NotFound(job_id));
    }

    info!("User {} deleted schedule job {}", current_user.user_name, job_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Forwards the stored job to the broker.
///
/// The body is optional; absent fields fall back to the configured destination.
pub async fn publish(
    current_user: CurrentUser,
    State(app): State<App>,
    Path(job_id): Path<i64>,
    params: Option<ValidatedJson<PublishParams>>,
) -> Result<(StatusCode, Json<ScheduleJob>), ScheduleJobError> {
    current_user.require_scope(WRITE_SCOPE)?;

    let params = params.map(|ValidatedJson(params)| params).unwrap_or_default();

    let job = find_job(&app, job_id).await?;

    let amqp = &app.config.amqp;
    let exchange = params.exchange.as_deref().unwrap_or(&amqp.exchange);
    let routing_key = params.routing_key.as_deref().unwrap_or(&amqp.routing_key);

    app.producer.send(exchange, routing_key, &job).await?;

    Ok((StatusCode::ACCEPTED, Json(job)))
}
