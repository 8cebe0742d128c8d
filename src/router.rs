use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{api, app::App, oauth2};

pub fn router(app: App) -> Router {
    Router::new()
        .route("/liveness", get(api::health_checks::ok))
        .route("/readiness", get(api::health_checks::readiness))
        .merge(oauth2::router())
        .nest("/api", api::router())
        .with_state(app)
        .layer(TraceLayer::new_for_http())
}
