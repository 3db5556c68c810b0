use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed language enum
/// Closed table - adding a language means adding a variant and a dispatch entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Kotlin,
    Rust,
    CSharp,
    Dart,
}

impl Language {
    /// Returns all language variants
    /// This is the single source of truth for supported languages
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Java,
            Language::Kotlin,
            Language::Rust,
            Language::CSharp,
            Language::Dart,
        ]
    }

    /// Parse a language from string (case-insensitive, accepts common aliases)
    pub fn from_str(s: &str) -> Option<Language> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "kotlin" | "kt" => Some(Language::Kotlin),
            "rust" | "rs" => Some(Language::Rust),
            "csharp" | "c#" | "cs" => Some(Language::CSharp),
            "dart" | "flutter" => Some(Language::Dart),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Rust => "rust",
            Language::CSharp => "csharp",
            Language::Dart => "dart",
        };
        write!(f, "{}", id)
    }
}

fn default_points() -> u32 {
    10
}

/// Challenge (Immutable Course Content)
/// Loaded read-only from course JSON, never mutated by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(flatten)]
    pub kind: ChallengeKind,
}

impl Challenge {
    pub fn challenge_type(&self) -> ChallengeType {
        self.kind.challenge_type()
    }
}

/// Variant-specific challenge payload
/// Exactly one shape is populated; the `type` field is the discriminator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeKind {
    MultipleChoice(MultipleChoice),
    TrueFalse(TrueFalse),
    CodeOutput(CodeOutput),
    FreeCoding(CodeChallenge),
    CodeCompletion(CodeChallenge),
    Conceptual(Conceptual),
}

impl ChallengeKind {
    pub fn challenge_type(&self) -> ChallengeType {
        match self {
            ChallengeKind::MultipleChoice(_) => ChallengeType::MultipleChoice,
            ChallengeKind::TrueFalse(_) => ChallengeType::TrueFalse,
            ChallengeKind::CodeOutput(_) => ChallengeType::CodeOutput,
            ChallengeKind::FreeCoding(_) => ChallengeType::FreeCoding,
            ChallengeKind::CodeCompletion(_) => ChallengeType::CodeCompletion,
            ChallengeKind::Conceptual(_) => ChallengeType::Conceptual,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoice {
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalse {
    pub correct_answer: bool,
    #[serde(default)]
    pub explanation: String,
}

/// Predict-the-output challenge
/// The snippet is shown to the learner and never re-executed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeOutput {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub expected_output: String,
    #[serde(default)]
    pub explanation: String,
}

/// Shared shape of free-coding and code-completion challenges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChallenge {
    pub language: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conceptual {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_words: Option<usize>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

/// Challenge discriminator
/// Mirrors `ChallengeKind` without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeType {
    MultipleChoice,
    TrueFalse,
    CodeOutput,
    FreeCoding,
    CodeCompletion,
    Conceptual,
}

impl ChallengeType {
    pub fn all_variants() -> &'static [ChallengeType] {
        &[
            ChallengeType::MultipleChoice,
            ChallengeType::TrueFalse,
            ChallengeType::CodeOutput,
            ChallengeType::FreeCoding,
            ChallengeType::CodeCompletion,
            ChallengeType::Conceptual,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::MultipleChoice => "MULTIPLE_CHOICE",
            ChallengeType::TrueFalse => "TRUE_FALSE",
            ChallengeType::CodeOutput => "CODE_OUTPUT",
            ChallengeType::FreeCoding => "FREE_CODING",
            ChallengeType::CodeCompletion => "CODE_COMPLETION",
            ChallengeType::Conceptual => "CONCEPTUAL",
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test Case Definition (Immutable Input)
/// Fetched, executed and discarded per submission - never persisted
/// Ordering matters - execution is sequential
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub expected_output: String,
    #[serde(default)]
    pub is_visible: bool,
}

/// Learner submission payload, one shape per challenge variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Choice(usize),
    TrueFalse(bool),
    Output(String),
    Code(String),
    Text(String),
}

impl Answer {
    pub fn kind(&self) -> &'static str {
        match self {
            Answer::Choice(_) => "choice",
            Answer::TrueFalse(_) => "true_false",
            Answer::Output(_) => "output",
            Answer::Code(_) => "code",
            Answer::Text(_) => "text",
        }
    }
}

/// Outcome of running a candidate program once
/// Created fresh per execution - never cached across submissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Failure that happened before or instead of a process run
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            elapsed_ms: 0,
            error: Some(error.into()),
        }
    }

    pub fn timed_out(timeout_ms: u64) -> Self {
        Self {
            elapsed_ms: timeout_ms,
            ..Self::failure("Execution timed out")
        }
    }

    /// Best human-readable reason for a failed run
    pub fn error_text(&self) -> String {
        if let Some(error) = &self.error {
            if self.stderr.trim().is_empty() {
                return error.clone();
            }
            return format!("{}\n{}", error, self.stderr.trim());
        }
        if !self.stderr.trim().is_empty() {
            return self.stderr.trim().to_string();
        }
        match self.exit_code {
            Some(code) => format!("Process exited with code {}", code),
            None => "Execution failed".to_string(),
        }
    }
}

/// Per-test outcome, aggregated into a ChallengeResult
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub description: String,
    pub passed: bool,
    pub actual_output: String,
    pub expected_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final verdict for one submission
///
/// ## Invariants:
/// - 0 <= score <= max_score
/// - is_correct follows the variant's own predicate, not score == max_score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResult {
    pub is_correct: bool,
    pub score: u32,
    pub max_score: u32,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Vec<TestCaseResult>>,
}
