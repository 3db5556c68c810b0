use codetutor_common::ChallengeType;
use thiserror::Error;

/// Named configuration and lookup failures
///
/// Wrong answers, failing tests and timeouts are never errors; they are
/// encoded in `ChallengeResult` / `ExecutionResult`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Unsupported challenge type: {0}")]
    UnsupportedChallengeType(String),

    #[error("Challenge {challenge_type} expects a different answer (got {got})")]
    AnswerMismatch {
        challenge_type: ChallengeType,
        got: &'static str,
    },

    #[error("Challenge not found: {lesson_id}/{challenge_id}")]
    ChallengeNotFound {
        lesson_id: String,
        challenge_id: String,
    },

    #[error("Invalid course content: {0}")]
    InvalidCourse(String),

    #[error("Course I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
