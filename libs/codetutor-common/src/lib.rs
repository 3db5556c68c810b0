pub mod config;
pub mod types;

// Re-export commonly used types for convenience
pub use config::Config;
pub use types::{
    Answer, Challenge, ChallengeKind, ChallengeResult, ChallengeType, ExecutionResult, Language,
    TestCase, TestCaseResult,
};
