//! Runtime Availability Prober
//!
//! Asks each language toolchain for its version once at startup and caches
//! the answers for the rest of the process lifetime.
//!
//! Until the probe has completed, every language is reported as available.
//! The UI therefore never waits on the probe, at the price of a short window
//! in which a missing toolchain looks installed.

use codetutor_common::{Config, Language};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::runner::{CommandRunner, CommandSpec, ProcessRunner};

/// Probe outcome for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeInfo {
    pub language: Language,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub install_hint: &'static str,
}

impl RuntimeInfo {
    /// Optimistic placeholder reported before probing
    pub fn assumed(language: Language) -> Self {
        Self {
            language,
            available: true,
            version: None,
            install_hint: install_hint(language),
        }
    }
}

/// Version-query commands, tried in order until one succeeds
pub fn probe_commands(language: Language) -> &'static [(&'static str, &'static [&'static str])] {
    match language {
        Language::Python => &[("python3", &["--version"]), ("python", &["--version"])],
        Language::JavaScript => &[("node", &["--version"])],
        Language::TypeScript => &[("npx", &["tsx", "--version"])],
        Language::Java => &[("java", &["-version"])],
        Language::Kotlin => &[("kotlinc", &["-version"])],
        Language::Rust => &[("rustc", &["--version"])],
        Language::CSharp => &[("dotnet", &["--version"])],
        Language::Dart => &[("dart", &["--version"])],
    }
}

pub fn install_hint(language: Language) -> &'static str {
    match language {
        Language::Python => "Install Python from https://python.org",
        Language::JavaScript => "Install Node.js from https://nodejs.org",
        Language::TypeScript => "Install Node.js from https://nodejs.org, then run `npm install -g tsx`",
        Language::Java => "Install Java JDK from https://adoptium.net",
        Language::Kotlin => "Install Kotlin from https://kotlinlang.org/docs/command-line.html",
        Language::Rust => "Install Rust from https://rustup.rs",
        Language::CSharp => "Install .NET SDK from https://dotnet.microsoft.com, then run `dotnet tool install -g dotnet-script`",
        Language::Dart => "Install Dart from https://dart.dev/get-dart",
    }
}

/// Probe a single language
pub async fn probe_language<R: CommandRunner + ?Sized>(runner: &R, language: Language) -> RuntimeInfo {
    for (program, args) in probe_commands(language) {
        let result = runner
            .run(&CommandSpec::new(*program).with_args(args.iter().copied()))
            .await;
        if result.success {
            // java -version reports on stderr
            let version = first_line(&result.stdout).or_else(|| first_line(&result.stderr));
            debug!(language = %language, program, version = ?version, "runtime found");
            return RuntimeInfo {
                language,
                available: true,
                version,
                install_hint: install_hint(language),
            };
        }
        debug!(language = %language, program, "probe command failed");
    }

    RuntimeInfo {
        language,
        available: false,
        version: None,
        install_hint: install_hint(language),
    }
}

/// Probe every supported language, one command at a time
pub async fn probe_all<R: CommandRunner + ?Sized>(runner: &R) -> Vec<RuntimeInfo> {
    let mut infos = Vec::with_capacity(Language::all_variants().len());
    for language in Language::all_variants() {
        infos.push(probe_language(runner, *language).await);
    }
    infos
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Write-once availability table
#[derive(Debug, Default)]
pub struct RuntimeAvailability {
    probed: OnceLock<HashMap<Language, RuntimeInfo>>,
}

impl RuntimeAvailability {
    pub const fn new() -> Self {
        Self {
            probed: OnceLock::new(),
        }
    }

    /// Store probe results; later calls are ignored and return false
    pub fn set(&self, infos: Vec<RuntimeInfo>) -> bool {
        let table = infos.into_iter().map(|i| (i.language, i)).collect();
        self.probed.set(table).is_ok()
    }

    pub fn is_probed(&self) -> bool {
        self.probed.get().is_some()
    }

    /// Availability of `language`; true while not yet probed
    pub fn is_available(&self, language: Language) -> bool {
        self.probed
            .get()
            .and_then(|table| table.get(&language))
            .map_or(true, |info| info.available)
    }

    /// Every language in table order, optimistic placeholders if not probed
    pub fn snapshot(&self) -> Vec<RuntimeInfo> {
        Language::all_variants()
            .iter()
            .map(|language| {
                self.probed
                    .get()
                    .and_then(|table| table.get(language))
                    .cloned()
                    .unwrap_or_else(|| RuntimeInfo::assumed(*language))
            })
            .collect()
    }
}

static RUNTIMES: RuntimeAvailability = RuntimeAvailability::new();

/// Process-wide availability table
pub fn global() -> &'static RuntimeAvailability {
    &RUNTIMES
}

/// Probe with the configured timeout and publish into the global table
pub async fn probe_and_publish(config: &Config) -> Vec<RuntimeInfo> {
    if let Err(e) = tokio::fs::create_dir_all(&config.sandbox_root).await {
        debug!(error = %e, "sandbox root unavailable for probing");
    }
    let runner = ProcessRunner::from_config(config).with_timeout_ms(config.probe_timeout_ms);
    let infos = probe_all(&runner).await;

    let available = infos.iter().filter(|i| i.available).count();
    info!(available, total = infos.len(), "runtime probe complete");

    if !global().set(infos.clone()) {
        debug!("runtime table already published, keeping first probe");
    }
    infos
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codetutor_common::ExecutionResult;
    use std::sync::Mutex;

    /// Runner that "has" only the listed programs installed
    struct FakeToolchains {
        installed: Vec<(&'static str, &'static str, &'static str)>,
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for FakeToolchains {
        async fn run(&self, cmd: &CommandSpec) -> ExecutionResult {
            self.asked.lock().unwrap().push(cmd.program.clone());
            match self.installed.iter().find(|(p, _, _)| *p == cmd.program) {
                Some((_, stdout, stderr)) => ExecutionResult {
                    success: true,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                    exit_code: Some(0),
                    elapsed_ms: 3,
                    error: None,
                },
                None => ExecutionResult::failure("Execution failed: No such file or directory"),
            }
        }
    }

    fn toolchains(installed: Vec<(&'static str, &'static str, &'static str)>) -> FakeToolchains {
        FakeToolchains {
            installed,
            asked: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_python_falls_back_to_python() {
        let runner = toolchains(vec![("python", "Python 3.12.1\n", "")]);
        let info = probe_language(&runner, Language::Python).await;

        assert!(info.available);
        assert_eq!(info.version.as_deref(), Some("Python 3.12.1"));
        assert_eq!(*runner.asked.lock().unwrap(), vec!["python3", "python"]);
    }

    #[tokio::test]
    async fn test_version_read_from_stderr() {
        let runner = toolchains(vec![(
            "java",
            "",
            "openjdk version \"21.0.2\" 2024-01-16\nOpenJDK Runtime Environment\n",
        )]);
        let info = probe_language(&runner, Language::Java).await;

        assert!(info.available);
        assert_eq!(info.version.as_deref(), Some("openjdk version \"21.0.2\" 2024-01-16"));
    }

    #[tokio::test]
    async fn test_missing_toolchain_has_install_hint() {
        let runner = toolchains(vec![]);
        let info = probe_language(&runner, Language::Rust).await;

        assert!(!info.available);
        assert!(info.version.is_none());
        assert_eq!(info.install_hint, "Install Rust from https://rustup.rs");
    }

    #[tokio::test]
    async fn test_probe_all_covers_every_language() {
        let runner = toolchains(vec![("node", "v20.11.0\n", "")]);
        let infos = probe_all(&runner).await;

        assert_eq!(infos.len(), Language::all_variants().len());
        let node = infos
            .iter()
            .find(|i| i.language == Language::JavaScript)
            .unwrap();
        assert!(node.available);
        assert!(infos
            .iter()
            .filter(|i| i.language != Language::JavaScript)
            .all(|i| !i.available));
    }

    #[test]
    fn test_unprobed_languages_are_optimistic() {
        let table = RuntimeAvailability::new();

        assert!(!table.is_probed());
        assert!(Language::all_variants().iter().all(|l| table.is_available(*l)));
        assert!(table.snapshot().iter().all(|i| i.available && i.version.is_none()));
    }

    #[test]
    fn test_table_is_write_once() {
        let table = RuntimeAvailability::new();
        let mut kotlin = RuntimeInfo::assumed(Language::Kotlin);
        kotlin.available = false;

        assert!(table.set(vec![kotlin.clone()]));
        assert!(!table.set(vec![RuntimeInfo::assumed(Language::Kotlin)]));

        assert!(table.is_probed());
        assert!(!table.is_available(Language::Kotlin));
        // absent from the probe result, still optimistic
        assert!(table.is_available(Language::Dart));
        assert_eq!(table.snapshot().len(), Language::all_variants().len());
    }
}
