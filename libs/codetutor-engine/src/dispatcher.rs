//! Language Dispatcher - (language, source) to a run plan, executed immediately
//!
//! Every invocation gets its own scratch directory under the sandbox root.
//! It holds the source, any compiled artifact and whatever the program
//! writes to its working directory. Three recipe shapes cover the closed
//! language table:
//! - `Interpreted`: interpreter invoked on `main.<ext>`
//! - `Compiled`: `main.<ext>` compiled to a sibling artifact, artifact run
//! - `ClassBased`: file named after the public class, compiled and run by class name
//!
//! The scratch directory is a `tempfile::TempDir`, so it is removed on
//! success, failure, timeout and task cancellation alike.

use async_trait::async_trait;
use codetutor_common::{Config, ExecutionResult, Language};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::{Builder, TempDir};
use tracing::{debug, info, warn};

use crate::engine::CodeExecutor;
use crate::error::EngineError;
use crate::runner::{CommandRunner, CommandSpec, ProcessRunner};

const SOURCE_PLACEHOLDER: &str = "{source}";
const ARTIFACT_PLACEHOLDER: &str = "{artifact}";
const TEMP_PREFIX: &str = "codetutor-";
const SOURCE_STEM: &str = "main";

/// Class name used when a class-oriented source declares no public class
pub const DEFAULT_CLASS_NAME: &str = "Main";

/// How one language is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipe {
    Interpreted {
        extension: &'static str,
        program: &'static str,
        args: &'static [&'static str],
    },
    Compiled {
        extension: &'static str,
        compiler: &'static str,
        compile_args: &'static [&'static str],
        artifact_suffix: &'static str,
        run_program: &'static str,
        run_args: &'static [&'static str],
    },
    ClassBased {
        extension: &'static str,
        compiler: &'static str,
        runner: &'static str,
    },
}

/// Dispatch table entry for a language
pub fn recipe_for(language: Language) -> Recipe {
    match language {
        Language::Python => Recipe::Interpreted {
            extension: "py",
            program: "python3",
            args: &[SOURCE_PLACEHOLDER],
        },
        Language::JavaScript => Recipe::Interpreted {
            extension: "js",
            program: "node",
            args: &[SOURCE_PLACEHOLDER],
        },
        Language::TypeScript => Recipe::Interpreted {
            extension: "ts",
            program: "npx",
            args: &["tsx", SOURCE_PLACEHOLDER],
        },
        Language::CSharp => Recipe::Interpreted {
            extension: "csx",
            program: "dotnet",
            args: &["script", SOURCE_PLACEHOLDER],
        },
        Language::Dart => Recipe::Interpreted {
            extension: "dart",
            program: "dart",
            args: &["run", SOURCE_PLACEHOLDER],
        },
        Language::Rust => Recipe::Compiled {
            extension: "rs",
            compiler: "rustc",
            compile_args: &[SOURCE_PLACEHOLDER, "-o", ARTIFACT_PLACEHOLDER],
            artifact_suffix: std::env::consts::EXE_SUFFIX,
            run_program: ARTIFACT_PLACEHOLDER,
            run_args: &[],
        },
        Language::Kotlin => Recipe::Compiled {
            extension: "kt",
            compiler: "kotlinc",
            compile_args: &[
                SOURCE_PLACEHOLDER,
                "-include-runtime",
                "-d",
                ARTIFACT_PLACEHOLDER,
            ],
            artifact_suffix: ".jar",
            run_program: "java",
            run_args: &["-jar", ARTIFACT_PLACEHOLDER],
        },
        Language::Java => Recipe::ClassBased {
            extension: "java",
            compiler: "javac",
            runner: "java",
        },
    }
}

/// Extract the declared public class name from Java-like source
pub fn extract_class_name(source: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"public\s+(?:(?:final|abstract)\s+)*class\s+(\w+)")
            .expect("class name pattern is valid")
    });
    pattern
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Process-backed `CodeExecutor`
pub struct LanguageDispatcher<R = ProcessRunner> {
    runner: R,
    sandbox_root: PathBuf,
}

impl LanguageDispatcher<ProcessRunner> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(ProcessRunner::from_config(config), config.sandbox_root.clone())
    }
}

impl<R: CommandRunner> LanguageDispatcher<R> {
    pub fn new(runner: R, sandbox_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            sandbox_root: sandbox_root.into(),
        }
    }

    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    /// Run `source` for an already-resolved language
    pub async fn execute_language(&self, language: Language, source: &str) -> ExecutionResult {
        let scratch = match self.scratch_dir().await {
            Ok(dir) => dir,
            Err(e) => return prepare_failure(e),
        };
        let dir = scratch.path();

        let result = match recipe_for(language) {
            Recipe::Interpreted {
                extension,
                program,
                args,
            } => self.run_interpreted(dir, source, extension, program, args).await,
            Recipe::Compiled {
                extension,
                compiler,
                compile_args,
                artifact_suffix,
                run_program,
                run_args,
            } => {
                self.run_compiled(
                    dir,
                    source,
                    extension,
                    (compiler, compile_args),
                    artifact_suffix,
                    (run_program, run_args),
                )
                .await
            }
            Recipe::ClassBased {
                extension,
                compiler,
                runner,
            } => self.run_class_based(dir, source, extension, compiler, runner).await,
        };
        release_dir(scratch);

        info!(
            language = %language,
            success = result.success,
            elapsed_ms = result.elapsed_ms,
            "execution finished"
        );
        result
    }

    async fn run_interpreted(
        &self,
        dir: &Path,
        source: &str,
        extension: &str,
        program: &str,
        args: &[&str],
    ) -> ExecutionResult {
        let source_path = match write_source(dir, SOURCE_STEM, extension, source).await {
            Ok(path) => path,
            Err(e) => return prepare_failure(e),
        };

        let cmd = CommandSpec::new(program)
            .with_args(expand(args, &source_path, None))
            .with_work_dir(dir);
        self.runner.run(&cmd).await
    }

    async fn run_compiled(
        &self,
        dir: &Path,
        source: &str,
        extension: &str,
        (compiler, compile_args): (&str, &[&str]),
        artifact_suffix: &str,
        (run_program, run_args): (&str, &[&str]),
    ) -> ExecutionResult {
        let source_path = match write_source(dir, SOURCE_STEM, extension, source).await {
            Ok(path) => path,
            Err(e) => return prepare_failure(e),
        };
        let artifact = artifact_path(&source_path, artifact_suffix);

        let compile = CommandSpec::new(compiler)
            .with_args(expand(compile_args, &source_path, Some(&artifact)))
            .with_work_dir(dir);
        let compiled = self.runner.run(&compile).await;
        if !compiled.success {
            debug!(compiler, "compilation failed, skipping run");
            return compiled;
        }

        let program = expand(&[run_program], &source_path, Some(&artifact)).remove(0);
        let run = CommandSpec::new(program)
            .with_args(expand(run_args, &source_path, Some(&artifact)))
            .with_work_dir(dir);
        self.runner.run(&run).await
    }

    async fn run_class_based(
        &self,
        dir: &Path,
        source: &str,
        extension: &str,
        compiler: &str,
        runner: &str,
    ) -> ExecutionResult {
        let class_name = extract_class_name(source).unwrap_or(DEFAULT_CLASS_NAME);
        let source_path = match write_source(dir, class_name, extension, source).await {
            Ok(path) => path,
            Err(e) => return prepare_failure(e),
        };

        let compile = CommandSpec::new(compiler)
            .with_args([source_path.to_string_lossy().into_owned()])
            .with_work_dir(dir);
        let compiled = self.runner.run(&compile).await;
        if !compiled.success {
            debug!(compiler, class_name, "compilation failed, skipping run");
            return compiled;
        }

        let run = CommandSpec::new(runner)
            .with_args([
                "-cp".to_string(),
                dir.to_string_lossy().into_owned(),
                class_name.to_string(),
            ])
            .with_work_dir(dir);
        self.runner.run(&run).await
    }

    /// Fresh per-invocation directory under the sandbox root
    async fn scratch_dir(&self) -> std::io::Result<TempDir> {
        tokio::fs::create_dir_all(&self.sandbox_root).await?;
        Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(&self.sandbox_root)
    }
}

#[async_trait]
impl<R: CommandRunner> CodeExecutor for LanguageDispatcher<R> {
    async fn execute(&self, language: &str, source: &str) -> ExecutionResult {
        match Language::from_str(language) {
            Some(language) => self.execute_language(language, source).await,
            None => {
                warn!(language, "refusing to execute unsupported language");
                ExecutionResult::failure(
                    EngineError::UnsupportedLanguage(language.to_string()).to_string(),
                )
            }
        }
    }
}

/// Substitute source and artifact paths into a command template
fn expand(template: &[&str], source: &Path, artifact: Option<&Path>) -> Vec<String> {
    template
        .iter()
        .map(|part| match *part {
            SOURCE_PLACEHOLDER => source.to_string_lossy().into_owned(),
            ARTIFACT_PLACEHOLDER => artifact
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            other => other.to_string(),
        })
        .collect()
}

async fn write_source(
    dir: &Path,
    stem: &str,
    extension: &str,
    source: &str,
) -> std::io::Result<PathBuf> {
    let path = dir.join(format!("{}.{}", stem, extension));
    tokio::fs::write(&path, source).await?;
    Ok(path)
}

/// `/sandbox/codetutor-ab12/main.rs` -> `/sandbox/codetutor-ab12/main` + suffix
fn artifact_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    source.with_file_name(format!("{}{}", stem, suffix))
}

fn prepare_failure(e: std::io::Error) -> ExecutionResult {
    warn!(error = %e, "could not prepare execution sandbox");
    ExecutionResult::failure(format!("Execution failed: {}", e))
}

fn release_dir(dir: TempDir) {
    let scratch = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        warn!(path = %scratch.display(), error = %e, "failed to remove scratch directory");
    }
}
