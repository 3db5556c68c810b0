// Route definitions for the CodeTutor API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/execute", post(handlers::execute_code))
        .route("/submit", post(handlers::submit_answer))
        .route("/run-visible", post(handlers::run_visible))
        .route("/runtimes", get(handlers::list_runtimes))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
}
