/// Test-Case Executor
///
/// Runs candidate source once per test case, strictly in declared order,
/// one process at a time.
///
/// ## Rules
/// For each test case:
/// 1. Inject declared input into the source (best effort, see `inject`)
/// 2. Execute through the `CodeExecutor`
/// 3. Failed execution (compile error, timeout, crash) → failed, error attached
/// 4. Otherwise pass iff normalized stdout == normalized expected output
///
/// A failing test case never stops the remaining ones: the learner sees
/// every failure, not just the first.
use codetutor_common::{ExecutionResult, TestCase, TestCaseResult};
use tracing::{debug, info};

use crate::engine::CodeExecutor;
use crate::inject::inject_input;
use crate::normalize::outputs_match;

/// Execute every test case against `source`, preserving order
pub async fn run_test_cases(
    executor: &dyn CodeExecutor,
    language: &str,
    source: &str,
    test_cases: &[TestCase],
) -> Vec<TestCaseResult> {
    info!(language, test_cases = test_cases.len(), "running test cases");

    let mut results = Vec::with_capacity(test_cases.len());
    for (index, test_case) in test_cases.iter().enumerate() {
        let result = run_test_case(executor, language, source, test_case).await;
        debug!(
            test = index + 1,
            description = %test_case.description,
            passed = result.passed,
            "test case evaluated"
        );
        results.push(result);
    }

    let passed = results.iter().filter(|r| r.passed).count();
    info!(passed, total = results.len(), "test cases complete");
    results
}

/// Execute a single test case
pub async fn run_test_case(
    executor: &dyn CodeExecutor,
    language: &str,
    source: &str,
    test_case: &TestCase,
) -> TestCaseResult {
    let execution = match test_case.input.as_deref() {
        Some(input) if !input.is_empty() => {
            let prepared = inject_input(language, source, input);
            executor.execute(language, &prepared).await
        }
        _ => executor.execute(language, source).await,
    };

    compare(test_case, execution)
}

fn compare(test_case: &TestCase, execution: ExecutionResult) -> TestCaseResult {
    if !execution.success {
        return TestCaseResult {
            description: test_case.description.clone(),
            passed: false,
            error: Some(execution.error_text()),
            actual_output: execution.stdout,
            expected_output: test_case.expected_output.clone(),
        };
    }

    TestCaseResult {
        description: test_case.description.clone(),
        passed: outputs_match(&execution.stdout, &test_case.expected_output),
        actual_output: execution.stdout,
        expected_output: test_case.expected_output.clone(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ok, ScriptedEngine};

    fn case(description: &str, input: Option<&str>, expected: &str) -> TestCase {
        TestCase {
            description: description.to_string(),
            input: input.map(str::to_string),
            expected_output: expected.to_string(),
            is_visible: true,
        }
    }

    #[tokio::test]
    async fn test_results_follow_declared_order() {
        let engine = ScriptedEngine::printing(&["1\n", "4\n", "9\n"]);
        let cases = vec![
            case("one", None, "1"),
            case("two", None, "5"),
            case("three", None, "9"),
        ];

        let results = run_test_cases(&engine, "python", "print(x)", &cases).await;

        let descriptions: Vec<_> = results.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["one", "two", "three"]);
        assert_eq!(
            results.iter().map(|r| r.passed).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        assert_eq!(results[1].actual_output, "4\n");
        assert_eq!(results[1].expected_output, "5");
        assert!(results[1].error.is_none());
    }

    #[tokio::test]
    async fn test_execution_failure_does_not_abort_siblings() {
        let timeout = ExecutionResult::timed_out(10_000);
        let crash = ExecutionResult {
            success: false,
            stderr: "ZeroDivisionError: division by zero\n".to_string(),
            exit_code: Some(1),
            ..ok("")
        };
        let engine = ScriptedEngine::new(vec![timeout, crash, ok("ok")]);
        let cases = vec![
            case("loops", None, "ok"),
            case("divides", None, "ok"),
            case("fine", None, "ok"),
        ];

        let results = run_test_cases(&engine, "python", "...", &cases).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].error.as_deref(), Some("Execution timed out"));
        assert_eq!(
            results[1].error.as_deref(),
            Some("ZeroDivisionError: division by zero")
        );
        assert!(!results[0].passed && !results[1].passed);
        assert!(results[2].passed);
        assert_eq!(engine.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_input_is_injected_only_when_declared() {
        let engine = ScriptedEngine::printing(&["2", "2"]);
        let cases = vec![case("with input", Some("1\n1"), "2"), case("no input", Some(""), "2")];

        run_test_cases(&engine, "python", "print(2)", &cases).await;

        let calls = engine.calls();
        assert!(calls[0].1.starts_with("_test_inputs = [\"1\", \"1\"]"));
        assert!(calls[0].1.ends_with("print(2)"));
        assert_eq!(calls[1].1, "print(2)");
    }

    #[tokio::test]
    async fn test_whitespace_differences_still_pass() {
        let engine = ScriptedEngine::printing(&["1 2\n3\n"]);
        let results =
            run_test_cases(&engine, "javascript", "src", &[case("grid", None, "1 2 3")]).await;
        assert!(results[0].passed);
    }
}
