mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use axum::Router;
use codetutor_common::Config;
use codetutor_engine::probe::{self, RuntimeAvailability};
use codetutor_engine::{
    CodeExecutor, CourseStore, JsonCourseStore, LanguageDispatcher, ProgressRecorder,
    TracingProgressRecorder,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn CodeExecutor>,
    pub store: Arc<dyn CourseStore>,
    pub recorder: Arc<dyn ProgressRecorder>,
    pub runtimes: &'static RuntimeAvailability,
    pub start_time: Arc<std::time::Instant>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new().merge(routes::routes()).with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("CodeTutor API booting...");

    let config = Config::from_env();
    info!(
        timeout_ms = config.execution_timeout_ms,
        sandbox_root = %config.sandbox_root.display(),
        "Configuration loaded"
    );

    // Initialize metrics
    metrics::init_metrics();
    info!("Metrics registry initialized");

    let store = JsonCourseStore::load(&config.course_path)
        .await
        .with_context(|| format!("loading course from {}", config.course_path.display()))?;
    info!(
        "Loaded course {} ({} challenges)",
        store.course_id(),
        store.len()
    );

    let state = Arc::new(AppState {
        executor: Arc::new(LanguageDispatcher::from_config(&config)),
        store: Arc::new(store),
        recorder: Arc::new(TracingProgressRecorder),
        runtimes: probe::global(),
        start_time: Arc::new(std::time::Instant::now()),
    });

    // Probe toolchains in the background; /runtimes is optimistic until done
    let probe_config = config.clone();
    tokio::spawn(async move {
        for runtime in probe::probe_and_publish(&probe_config).await {
            metrics::record_runtime(&runtime.language.to_string(), runtime.available);
        }
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("HTTP server listening on {}", addr);
    info!("Ready to grade submissions");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
