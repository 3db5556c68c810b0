// Prometheus metrics for the CodeTutor API

use codetutor_common::Language;
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use tracing::error;

lazy_static! {
    // Global registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Graded submissions (counter with challenge type and outcome labels)
    pub static ref SUBMISSIONS_GRADED: CounterVec = CounterVec::new(
        Opts::new("codetutor_submissions_graded_total", "Total number of graded submissions"),
        &["challenge_type", "outcome"]
    )
    .expect("metric can be created");

    // Submissions rejected before grading (unknown challenge, wrong answer shape)
    pub static ref SUBMISSIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("codetutor_submissions_rejected_total", "Total submissions rejected before grading"),
        &["reason"]
    )
    .expect("metric can be created");

    // Code executions (counter with language and status labels)
    pub static ref EXECUTIONS: CounterVec = CounterVec::new(
        Opts::new("codetutor_executions_total", "Total number of code executions"),
        &["language", "status"]
    )
    .expect("metric can be created");

    // Execution time histogram (in milliseconds)
    pub static ref EXECUTION_TIME: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "codetutor_execution_time_ms",
            "Code execution time in milliseconds"
        )
        .buckets(vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]),
        &["language"]
    )
    .expect("metric can be created");

    // Runtime availability gauge (1 = toolchain found)
    pub static ref RUNTIME_AVAILABLE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("codetutor_runtime_available", "Whether a language toolchain was found at startup"),
        &["language"]
    )
    .expect("metric can be created");

    // API request counter
    pub static ref API_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("codetutor_api_requests_total", "Total API requests"),
        &["endpoint", "method", "status"]
    )
    .expect("metric can be created");
}

/// Initialize metrics registry
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(SUBMISSIONS_GRADED.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(SUBMISSIONS_REJECTED.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(EXECUTIONS.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(EXECUTION_TIME.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(RUNTIME_AVAILABLE.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(API_REQUESTS.clone()))
        .expect("collector can be registered");
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record a graded submission
pub fn record_submission(challenge_type: &str, is_correct: bool) {
    let outcome = if is_correct { "correct" } else { "incorrect" };
    SUBMISSIONS_GRADED
        .with_label_values(&[challenge_type, outcome])
        .inc();
}

/// Record a submission rejected before grading
pub fn record_submission_rejected(reason: &str) {
    SUBMISSIONS_REJECTED.with_label_values(&[reason]).inc();
}

/// Label for a client-supplied language id
///
/// Aliases collapse to the canonical name and anything else to
/// `unsupported`, so the label set stays bounded.
pub fn language_label(language: &str) -> String {
    Language::from_str(language)
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unsupported".to_string())
}

/// Record one code execution
pub fn record_execution(language: &str, success: bool, elapsed_ms: u64) {
    let language = language_label(language);
    let status = if success { "success" } else { "failure" };
    EXECUTIONS.with_label_values(&[&language, status]).inc();
    EXECUTION_TIME
        .with_label_values(&[&language])
        .observe(elapsed_ms as f64);
}

/// Publish probe results
pub fn record_runtime(language: &str, available: bool) {
    RUNTIME_AVAILABLE
        .with_label_values(&[language])
        .set(i64::from(available));
}

/// Record an API request
pub fn record_request(endpoint: &str, method: &str, status: u16) {
    API_REQUESTS
        .with_label_values(&[endpoint, method, &status.to_string()])
        .inc();
}
