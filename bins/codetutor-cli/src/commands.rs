// CLI commands for CodeTutor
use anyhow::{bail, Context, Result};
use clap::Args;
use codetutor_common::{Answer, Config, ExecutionResult, Language};
use codetutor_engine::evaluator::hints_from_failures;
use codetutor_engine::precheck::check_common_issues;
use codetutor_engine::{probe, submit, CodeExecutor, CourseStore, JsonCourseStore, LanguageDispatcher};
use std::fs;
use std::path::Path;

/// Answer payload flags; exactly one must be given
#[derive(Args, Debug, Default)]
pub struct AnswerArgs {
    /// Selected option index (multiple choice)
    #[arg(long)]
    pub choice: Option<usize>,

    /// True/false answer
    #[arg(long = "bool")]
    pub boolean: Option<bool>,

    /// Predicted program output (code output)
    #[arg(long)]
    pub output: Option<String>,

    /// File holding the submitted source (free coding / code completion)
    #[arg(long)]
    pub code_file: Option<std::path::PathBuf>,

    /// Free-text answer (conceptual)
    #[arg(long)]
    pub text: Option<String>,
}

impl AnswerArgs {
    /// Build the single answer these flags describe
    pub fn to_answer(&self) -> Result<Answer> {
        let mut answers = Vec::new();
        if let Some(choice) = self.choice {
            answers.push(Answer::Choice(choice));
        }
        if let Some(value) = self.boolean {
            answers.push(Answer::TrueFalse(value));
        }
        if let Some(output) = &self.output {
            answers.push(Answer::Output(output.clone()));
        }
        if let Some(path) = &self.code_file {
            let code = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            answers.push(Answer::Code(code));
        }
        if let Some(text) = &self.text {
            answers.push(Answer::Text(text.clone()));
        }

        match answers.len() {
            0 => bail!("No answer given. Use one of --choice, --bool, --output, --code-file, --text"),
            1 => Ok(answers.remove(0)),
            _ => bail!("Only one answer flag may be given"),
        }
    }
}

/// Execute a source file once
pub async fn run_file(config: &Config, language: &str, file: &Path) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    for issue in check_common_issues(language, &source) {
        println!("⚠️  {}", issue);
    }

    let dispatcher = LanguageDispatcher::from_config(config);
    let result = dispatcher.execute(language, &source).await;
    print_execution(&result);

    if !result.success {
        bail!("Execution failed");
    }
    Ok(())
}

fn print_execution(result: &ExecutionResult) {
    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
    }
    if let Some(error) = &result.error {
        eprintln!("✗ {}", error);
    }
    println!(
        "\n{} exit code {} in {}ms",
        if result.success { "✓" } else { "✗" },
        result
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string()),
        result.elapsed_ms
    );
}

/// Grade an answer and print the verdict
pub async fn submit_answer(
    config: &Config,
    course: &Path,
    lesson_id: &str,
    challenge_id: &str,
    answer: &AnswerArgs,
) -> Result<()> {
    let store = JsonCourseStore::load(course)
        .await
        .with_context(|| format!("Failed to load course {}", course.display()))?;
    let challenge = store.challenge(lesson_id, challenge_id)?;
    let answer = answer.to_answer()?;

    println!("📝 {} ({})", challenge.title, challenge.challenge_type());

    let dispatcher = LanguageDispatcher::from_config(config);
    let result = submit(&dispatcher, &challenge, &answer).await?;

    if let Some(tests) = &result.test_results {
        for (i, test) in tests.iter().enumerate() {
            let mark = if test.passed { "✓" } else { "✗" };
            println!("  {} Test {}: {}", mark, i + 1, test.description);
        }
        for hint in hints_from_failures(tests) {
            println!("    → {}", hint);
        }
    }

    println!();
    println!("{}", result.feedback);
    println!(
        "{} Score: {} / {}",
        if result.is_correct { "✅" } else { "❌" },
        result.score,
        result.max_score
    );
    Ok(())
}

/// Print the lesson outline of a course
pub async fn list_lessons(course: &Path) -> Result<()> {
    let store = JsonCourseStore::load(course)
        .await
        .with_context(|| format!("Failed to load course {}", course.display()))?;

    println!("📚 {} ({})", store.title(), store.course_id());
    for lesson in store.outline() {
        println!("  {} / {}: {}", lesson.module_id, lesson.lesson_id, lesson.title);
        for id in &lesson.challenge_ids {
            println!("    - {}", id);
        }
    }
    println!("\nTotal challenges: {}", store.len());
    Ok(())
}

/// Probe toolchains and print a table
pub async fn list_runtimes(config: &Config) -> Result<()> {
    println!("🔍 Probing language toolchains...\n");

    let runtimes = probe::probe_and_publish(config).await;
    for runtime in &runtimes {
        if runtime.available {
            println!(
                "  ✓ {:<12} {}",
                runtime.language.to_string(),
                runtime.version.as_deref().unwrap_or("")
            );
        } else {
            println!(
                "  ✗ {:<12} {}",
                runtime.language.to_string(),
                runtime.install_hint
            );
        }
    }

    let available = runtimes.iter().filter(|r| r.available).count();
    println!("\n{}/{} toolchains available", available, runtimes.len());
    Ok(())
}

/// Static checks only, no execution
pub fn check_file(language: &str, file: &Path) -> Result<()> {
    if Language::from_str(language).is_none() {
        bail!("Unsupported language: {}", language);
    }
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let issues = check_common_issues(language, &source);
    if issues.is_empty() {
        println!("✓ No common issues found");
        return Ok(());
    }
    for issue in &issues {
        println!("⚠️  {}", issue);
    }
    println!("\n{} issue(s) found", issues.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_answer_flag() {
        let args = AnswerArgs {
            choice: Some(2),
            ..Default::default()
        };
        assert_eq!(args.to_answer().unwrap(), Answer::Choice(2));
    }

    #[test]
    fn test_answer_flags_are_exclusive() {
        let none = AnswerArgs::default();
        assert!(none.to_answer().is_err());

        let two = AnswerArgs {
            boolean: Some(true),
            text: Some("x".into()),
            ..Default::default()
        };
        assert!(two.to_answer().is_err());
    }

    #[test]
    fn test_code_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        fs::write(&path, "print(1)").unwrap();

        let args = AnswerArgs {
            code_file: Some(path),
            ..Default::default()
        };
        assert_eq!(args.to_answer().unwrap(), Answer::Code("print(1)".into()));
    }

    #[test]
    fn test_check_rejects_unknown_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.cob");
        fs::write(&path, "").unwrap();
        assert!(check_file("cobol", &path).is_err());
    }
}
