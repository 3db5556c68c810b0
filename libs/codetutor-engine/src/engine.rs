/// Execution Engine - Abstraction for Code Execution
///
/// **Core Responsibility:**
/// Run candidate source once in a given language and return the raw
/// `ExecutionResult`.
///
/// **Architectural Boundary:**
/// - Engine knows HOW to execute (temp files, compilers, interpreters)
/// - Engine does NOT know scoring rules
/// - Engine does NOT compare outputs
///
/// The process-backed implementation is `LanguageDispatcher`; the scoring
/// code only ever sees this trait, so it can be exercised with scripted
/// engines.
use async_trait::async_trait;
use codetutor_common::ExecutionResult;

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Execute `source` written in `language` (a language identifier such
    /// as `python` or `c#`)
    ///
    /// Never fails: unsupported languages, compile errors, timeouts and
    /// spawn failures come back as `success = false`.
    async fn execute(&self, language: &str, source: &str) -> ExecutionResult;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Engine that replays pre-recorded results in order
    /// and remembers every (language, source) it was asked to run
    #[derive(Default)]
    pub struct ScriptedEngine {
        results: Mutex<VecDeque<ExecutionResult>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedEngine {
        pub fn new(results: Vec<ExecutionResult>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Engine whose every run prints the given stdout lines, one per call
        pub fn printing(outputs: &[&str]) -> Self {
            Self::new(outputs.iter().map(|out| ok(out)).collect())
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CodeExecutor for ScriptedEngine {
        async fn execute(&self, language: &str, source: &str) -> ExecutionResult {
            self.calls
                .lock()
                .unwrap()
                .push((language.to_string(), source.to_string()));
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ExecutionResult::failure("no scripted result left"))
        }
    }

    pub fn ok(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
            elapsed_ms: 5,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_engine_replays_in_order() {
        let engine = ScriptedEngine::printing(&["first", "second"]);

        assert_eq!(engine.execute("python", "a").await.stdout, "first");
        assert_eq!(engine.execute("python", "b").await.stdout, "second");
        assert!(!engine.execute("python", "c").await.success);
        assert_eq!(engine.calls().len(), 3);
        assert_eq!(engine.calls()[1], ("python".to_string(), "b".to_string()));
    }
}
