//! Progress recorder: notified after grading, never awaited by the engine

use async_trait::async_trait;
use codetutor_common::ChallengeResult;
use tracing::info;

#[async_trait]
pub trait ProgressRecorder: Send + Sync {
    async fn record(&self, lesson_id: &str, challenge_id: &str, result: &ChallengeResult);
}

/// Recorder that only emits a structured log line per graded submission
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressRecorder;

#[async_trait]
impl ProgressRecorder for TracingProgressRecorder {
    async fn record(&self, lesson_id: &str, challenge_id: &str, result: &ChallengeResult) {
        info!(
            lesson_id,
            challenge_id,
            is_correct = result.is_correct,
            score = result.score,
            max_score = result.max_score,
            "progress recorded"
        );
    }
}
