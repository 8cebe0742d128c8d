pub mod health_checks;
pub mod schedule_jobs;
pub mod unique_constraint;
pub mod validated_json;

use axum::Router;

use crate::app::App;

/// Resource API mounted under `/api`
pub fn router() -> Router<App> {
    Router::new().merge(schedule_jobs::router())
}
