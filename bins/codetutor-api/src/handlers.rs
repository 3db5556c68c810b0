// HTTP route handlers for the CodeTutor API

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use codetutor_common::{Answer, ChallengeResult, ExecutionResult};
use codetutor_engine::evaluator::{hints_from_failures, run_visible_tests};
use codetutor_engine::{factory, EngineError, RuntimeInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{metrics, AppState};

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub language: String,
    pub source_code: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub lesson_id: String,
    pub challenge_id: String,
    pub answer: Answer,
}

#[derive(Debug, Deserialize)]
pub struct RunVisibleRequest {
    pub lesson_id: String,
    pub challenge_id: String,
    pub source_code: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission_id: Uuid,
    pub graded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ChallengeResult,
}

#[derive(Debug, Serialize)]
pub struct RunVisibleResponse {
    #[serde(flatten)]
    pub result: ChallengeResult,
    pub hints: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub runtimes_probed: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Configuration and lookup failures mapped onto HTTP status codes
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::ChallengeNotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::UnsupportedLanguage(_)
            | EngineError::UnsupportedChallengeType(_)
            | EngineError::AnswerMismatch { .. } => StatusCode::BAD_REQUEST,
            EngineError::InvalidCourse(_) | EngineError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn reason(&self) -> &'static str {
        match &self.0 {
            EngineError::ChallengeNotFound { .. } => "not_found",
            EngineError::UnsupportedLanguage(_) => "unsupported_language",
            EngineError::UnsupportedChallengeType(_) => "unsupported_challenge_type",
            EngineError::AnswerMismatch { .. } => "answer_mismatch",
            EngineError::InvalidCourse(_) | EngineError::Io(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::record_submission_rejected(self.reason());
        warn!(status = status.as_u16(), error = %self.0, "request rejected");
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// POST /execute - Run source once and return the raw result
pub async fn execute_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> Json<ExecutionResult> {
    let result = state
        .executor
        .execute(&payload.language, &payload.source_code)
        .await;

    metrics::record_execution(&payload.language, result.success, result.elapsed_ms);
    metrics::record_request("/execute", "POST", 200);
    Json(result)
}

/// POST /submit - Grade an answer against a course challenge
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let outcome = grade(&state, &payload).await;
    metrics::record_request("/submit", "POST", status_of(&outcome));
    let result = outcome?;

    let submission_id = Uuid::new_v4();
    info!(
        %submission_id,
        lesson_id = %payload.lesson_id,
        challenge_id = %payload.challenge_id,
        score = result.score,
        "submission graded"
    );

    // Fire-and-forget: the response never waits on progress bookkeeping
    let recorder = Arc::clone(&state.recorder);
    let (lesson_id, challenge_id) = (payload.lesson_id.clone(), payload.challenge_id.clone());
    let recorded = result.clone();
    tokio::spawn(async move {
        recorder.record(&lesson_id, &challenge_id, &recorded).await;
    });

    Ok(Json(SubmitResponse {
        submission_id,
        graded_at: Utc::now(),
        result,
    }))
}

async fn grade(state: &AppState, payload: &SubmitRequest) -> Result<ChallengeResult, ApiError> {
    let challenge = state
        .store
        .challenge(&payload.lesson_id, &payload.challenge_id)?;
    let result = factory::submit(state.executor.as_ref(), &challenge, &payload.answer).await?;
    metrics::record_submission(challenge.challenge_type().as_str(), result.is_correct);
    Ok(result)
}

/// POST /run-visible - Run only the visible test cases ("Run" button)
pub async fn run_visible(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunVisibleRequest>,
) -> Result<Json<RunVisibleResponse>, ApiError> {
    let outcome = async {
        let challenge = state
            .store
            .challenge(&payload.lesson_id, &payload.challenge_id)?;
        let result =
            run_visible_tests(state.executor.as_ref(), &challenge, &payload.source_code).await?;
        Ok::<_, ApiError>(result)
    }
    .await;
    metrics::record_request("/run-visible", "POST", status_of(&outcome));

    let result = outcome?;
    let hints = result
        .test_results
        .as_deref()
        .map(hints_from_failures)
        .unwrap_or_default();
    Ok(Json(RunVisibleResponse { result, hints }))
}

/// GET /runtimes - Toolchain availability (optimistic until probed)
pub async fn list_runtimes(State(state): State<Arc<AppState>>) -> Json<Vec<RuntimeInfo>> {
    metrics::record_request("/runtimes", "GET", 200);
    Json(state.runtimes.snapshot())
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
        runtimes_probed: state.runtimes.is_probed(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}

fn status_of<T>(outcome: &Result<T, ApiError>) -> u16 {
    match outcome {
        Ok(_) => StatusCode::OK.as_u16(),
        Err(e) => e.status().as_u16(),
    }
}
