/// Challenge Evaluator - Per-Variant Scoring Logic
///
/// **Core Responsibility:**
/// Turn a learner answer into a `ChallengeResult`.
///
/// **Critical Properties:**
/// - Knows nothing about processes, temp files or interpreters
/// - Code-bearing variants go through `executor::run_test_cases` and the
///   `CodeExecutor` trait, never the runner directly
/// - Always returns a result: wrong answers and failing tests are data
///
/// **Scoring Rules:**
/// - Multiple choice / true-false / code output: full points or zero
/// - Free coding / code completion: full points when every test passes,
///   otherwise `floor(points * passed / total)` (integer division)
/// - Conceptual: `points * (0.5 if long enough else 0.3)
///   + points * coverage * 0.5`, truncated and clamped to `[0, points]`
use codetutor_common::types::{CodeChallenge, CodeOutput, Conceptual, MultipleChoice, TrueFalse};
use codetutor_common::{Challenge, ChallengeKind, ChallengeResult, TestCaseResult};
use tracing::info;

use crate::engine::CodeExecutor;
use crate::error::{EngineError, Result};
use crate::executor::run_test_cases;
use crate::normalize::outputs_match;

/// Fraction of key points a conceptual answer must touch to count as correct
pub const CONCEPTUAL_COVERAGE_THRESHOLD: f64 = 0.5;

/// Which code-bearing variant is being graded (only feedback differs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMode {
    FreeCoding,
    CodeCompletion,
}

impl CodeMode {
    fn feedback(&self, passed: usize, total: usize) -> String {
        match (self, passed == total) {
            (CodeMode::FreeCoding, true) => {
                format!("All {} test cases passed! Great job!", total)
            }
            (CodeMode::FreeCoding, false) => {
                format!("Passed {}/{} test cases. Keep trying!", passed, total)
            }
            (CodeMode::CodeCompletion, true) => {
                format!("All {} test cases passed! Code completed successfully!", total)
            }
            (CodeMode::CodeCompletion, false) => {
                format!("Passed {}/{} test cases. Check your TODO sections.", passed, total)
            }
        }
    }
}

pub fn validate_multiple_choice(
    points: u32,
    challenge: &MultipleChoice,
    selected: usize,
) -> ChallengeResult {
    all_or_nothing(points, selected == challenge.correct_answer, &challenge.explanation)
}

pub fn validate_true_false(points: u32, challenge: &TrueFalse, answer: bool) -> ChallengeResult {
    all_or_nothing(points, answer == challenge.correct_answer, &challenge.explanation)
}

/// Predicted output against the expected output, both normalized
pub fn validate_code_output(points: u32, challenge: &CodeOutput, output: &str) -> ChallengeResult {
    if outputs_match(output, &challenge.expected_output) {
        return all_or_nothing(points, true, &challenge.explanation);
    }

    let feedback = format!(
        "Incorrect. Expected: {}\nYour answer: {}\n\n{}",
        challenge.expected_output.trim(),
        output.trim(),
        challenge.explanation
    );
    ChallengeResult {
        is_correct: false,
        score: 0,
        max_score: points,
        feedback: feedback.trim_end().to_string(),
        test_results: None,
    }
}

/// Run every test case of a code-bearing challenge and score the outcome
pub async fn validate_code(
    executor: &dyn CodeExecutor,
    points: u32,
    mode: CodeMode,
    challenge: &CodeChallenge,
    code: &str,
) -> ChallengeResult {
    let results = run_test_cases(executor, &challenge.language, code, &challenge.test_cases).await;
    score_test_results(points, mode, results)
}

/// Aggregate test results into a verdict
///
/// Zero test cases counts as all passed.
pub fn score_test_results(
    points: u32,
    mode: CodeMode,
    results: Vec<TestCaseResult>,
) -> ChallengeResult {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let all_passed = passed == total;

    let score = if all_passed {
        points
    } else {
        (u64::from(points) * passed as u64 / total as u64) as u32
    };

    info!(passed, total, score, max_score = points, "code challenge scored");

    ChallengeResult {
        is_correct: all_passed,
        score,
        max_score: points,
        feedback: mode.feedback(passed, total),
        test_results: Some(results),
    }
}

/// Score a free-text answer on length and key-point coverage
///
/// No execution happens. A key point counts as mentioned when any of its
/// words longer than 3 characters occurs (case-insensitively) anywhere in
/// the answer.
pub fn validate_conceptual(points: u32, challenge: &Conceptual, answer: &str) -> ChallengeResult {
    let word_count = word_count(answer);
    let meets_min_words = challenge
        .min_words
        .map_or(true, |min| word_count >= min);

    let coverage = key_point_coverage(&challenge.key_points, answer);

    let length_weight = if meets_min_words { 0.5 } else { 0.3 };
    let raw = f64::from(points) * length_weight + f64::from(points) * coverage * 0.5;
    let score = raw.clamp(0.0, f64::from(points)) as u32;

    let mut feedback = String::from("Your answer has been submitted. ");
    if let (false, Some(min)) = (meets_min_words, challenge.min_words) {
        feedback.push_str(&format!(
            "Consider expanding your answer (minimum {} words). ",
            min
        ));
    }
    if coverage < CONCEPTUAL_COVERAGE_THRESHOLD && !challenge.key_points.is_empty() {
        feedback.push_str("Try to cover more key concepts. ");
    }

    ChallengeResult {
        is_correct: meets_min_words && coverage >= CONCEPTUAL_COVERAGE_THRESHOLD,
        score,
        max_score: points,
        feedback: feedback.trim_end().to_string(),
        test_results: None,
    }
}

/// Words separated by space, tab, CR or LF; other whitespace joins words
pub fn word_count(answer: &str) -> usize {
    answer
        .split([' ', '\t', '\r', '\n'])
        .filter(|word| !word.is_empty())
        .count()
}

/// Fraction of key points mentioned in `answer`; 1.0 when none are declared
pub fn key_point_coverage(key_points: &[String], answer: &str) -> f64 {
    if key_points.is_empty() {
        return 1.0;
    }

    let answer = answer.to_lowercase();
    let mentioned = key_points
        .iter()
        .filter(|point| {
            let point = point.to_lowercase();
            point
                .split([' ', ',', '.', '!', '?'])
                .filter(|word| word.chars().count() > 3)
                .any(|word| answer.contains(word))
        })
        .count();

    mentioned as f64 / key_points.len() as f64
}

/// Learner "Run" button: only visible test cases, same scoring rules
pub async fn run_visible_tests(
    executor: &dyn CodeExecutor,
    challenge: &Challenge,
    code: &str,
) -> Result<ChallengeResult> {
    let (mode, code_challenge) = match &challenge.kind {
        ChallengeKind::FreeCoding(c) => (CodeMode::FreeCoding, c),
        ChallengeKind::CodeCompletion(c) => (CodeMode::CodeCompletion, c),
        _ => {
            return Err(EngineError::AnswerMismatch {
                challenge_type: challenge.challenge_type(),
                got: "code",
            })
        }
    };

    let visible: Vec<_> = code_challenge
        .test_cases
        .iter()
        .filter(|tc| tc.is_visible)
        .cloned()
        .collect();
    let results = run_test_cases(executor, &code_challenge.language, code, &visible).await;
    Ok(score_test_results(challenge.points, mode, results))
}

/// One message per failed test case: its error, or the output mismatch
pub fn hints_from_failures(results: &[TestCaseResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| match &r.error {
            Some(error) => error.clone(),
            None => format!(
                "Expected \"{}\", but got \"{}\"",
                r.expected_output.trim(),
                r.actual_output.trim()
            ),
        })
        .collect()
}

fn all_or_nothing(points: u32, correct: bool, explanation: &str) -> ChallengeResult {
    let verdict = if correct { "Correct!" } else { "Incorrect." };
    let feedback = if explanation.trim().is_empty() {
        verdict.to_string()
    } else {
        format!("{} {}", verdict, explanation.trim())
    };

    ChallengeResult {
        is_correct: correct,
        score: if correct { points } else { 0 },
        max_score: points,
        feedback,
        test_results: None,
    }
}
