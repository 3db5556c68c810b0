//! Process Runner - one child process per invocation
//!
//! Spawns an external interpreter, compiler or compiled artifact with
//! redirected stdout/stderr, waits up to a wall-clock timeout and reports an
//! `ExecutionResult`.
//!
//! The runner does NOT sandbox the child. Containment is limited to:
//! - the timeout (the whole process group is killed on expiry)
//! - on Unix, `setrlimit` bounds on CPU time, file size and optionally
//!   address space, applied in the child before `exec`
//! - a reduced environment (PATH, HOME at the sandbox root, temp vars at the
//!   working directory)
//! - the working directory chosen by the caller
//! - output capped while it is read
//!
//! Untrusted code can still touch the filesystem and network with the
//! privileges of the engine process. That is a known weak boundary.

use async_trait::async_trait;
use codetutor_common::{Config, ExecutionResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100_000;
pub const DEFAULT_CPU_TIME_LIMIT_SECS: u64 = 10;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name (resolved through PATH)
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Shell-like rendering for logs
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Resource bounds applied to every invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    pub timeout_ms: u64,
    pub max_output_bytes: usize,
    /// Unix only
    pub cpu_time_limit_secs: u64,
    /// Linux only; 0 means unlimited
    pub max_memory_bytes: u64,
    /// Unix only
    pub max_file_bytes: u64,
}

impl RunLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout_ms: config.execution_timeout_ms,
            max_output_bytes: config.max_output_bytes,
            cpu_time_limit_secs: config.cpu_time_limit_secs,
            max_memory_bytes: config.max_memory_bytes,
            max_file_bytes: config.max_file_bytes,
        }
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            cpu_time_limit_secs: DEFAULT_CPU_TIME_LIMIT_SECS,
            max_memory_bytes: 0,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Runner trait for executing programs
///
/// Implementations never fail: spawn errors and timeouts are reported
/// through `ExecutionResult` with `success = false`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &CommandSpec) -> ExecutionResult;
}

/// Runner that spawns real child processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    limits: RunLimits,
    sandbox_root: PathBuf,
}

impl ProcessRunner {
    pub fn new(limits: RunLimits, sandbox_root: impl Into<PathBuf>) -> Self {
        Self {
            limits,
            sandbox_root: sandbox_root.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(RunLimits::from_config(config), config.sandbox_root.clone())
    }

    /// Same runner with a different timeout (used by the runtime prober)
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.limits.timeout_ms = timeout_ms;
        self
    }

    pub fn limits(&self) -> RunLimits {
        self.limits
    }

    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    pub async fn execute(&self, cmd: &CommandSpec) -> ExecutionResult {
        let started = Instant::now();
        debug!(command = %cmd.display(), "spawning process");

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }
        self.restrict_environment(&mut command, cmd.work_dir.as_deref());

        #[cfg(unix)]
        {
            // Own process group so a timeout can take down grandchildren too
            command.process_group(0);

            let limits = self.limits;
            // SAFETY: the hook only issues getrlimit/setrlimit syscalls,
            // which are async-signal-safe
            unsafe {
                command.pre_exec(move || apply_rlimits(&limits));
            }
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %cmd.program, error = %e, "failed to spawn process");
                return ExecutionResult {
                    elapsed_ms: elapsed_ms(started),
                    ..ExecutionResult::failure(format!("Execution failed: {}", e))
                };
            }
        };
        let pid = child.id();
        let max_bytes = self.limits.max_output_bytes;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = async {
            let (stdout, stderr, status) = tokio::join!(
                read_capped(stdout, max_bytes),
                read_capped(stderr, max_bytes),
                child.wait()
            );
            status.map(|status| (status, stdout, stderr))
        };

        let timeout = Duration::from_millis(self.limits.timeout_ms);
        let outcome = tokio::time::timeout(timeout, finished).await;
        match outcome {
            Ok(Ok((status, stdout, stderr))) => {
                let exit_code = status.code();
                debug!(
                    program = %cmd.program,
                    exit_code = ?exit_code,
                    elapsed_ms = elapsed_ms(started),
                    "process finished"
                );
                ExecutionResult {
                    success: status.success(),
                    stdout: capture(&stdout, max_bytes),
                    stderr: capture(&stderr, max_bytes),
                    exit_code,
                    elapsed_ms: elapsed_ms(started),
                    error: None,
                }
            }
            Ok(Err(e)) => {
                warn!(program = %cmd.program, error = %e, "failed to wait for process");
                ExecutionResult {
                    elapsed_ms: elapsed_ms(started),
                    ..ExecutionResult::failure(format!("Execution failed: {}", e))
                }
            }
            Err(_) => {
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "direct child already exited");
                }
                kill_process_group(pid);
                warn!(
                    program = %cmd.program,
                    timeout_ms = self.limits.timeout_ms,
                    "process timed out and was killed"
                );
                ExecutionResult::timed_out(self.limits.timeout_ms)
            }
        }
    }

    fn restrict_environment(&self, command: &mut Command, work_dir: Option<&Path>) {
        command.env_clear();
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
        #[cfg(windows)]
        for key in ["SYSTEMROOT", "WINDIR", "PATHEXT"] {
            if let Some(value) = std::env::var_os(key) {
                command.env(key, value);
            }
        }
        // Toolchain caches under HOME outlive the run; scratch files do not
        let scratch = work_dir.unwrap_or(&self.sandbox_root);
        command
            .env("HOME", &self.sandbox_root)
            .env("TEMP", scratch)
            .env("TMP", scratch)
            .env("TMPDIR", scratch)
            .env("NO_PROXY", "*")
            .env("no_proxy", "*");
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(
            RunLimits::default(),
            std::env::temp_dir().join("codetutor-sandbox"),
        )
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, cmd: &CommandSpec) -> ExecutionResult {
        self.execute(cmd).await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Read a pipe to EOF, keeping at most `max_bytes + 1` bytes
///
/// The extra byte lets `capture` tell a full-length output from a truncated
/// one. Everything past it is read and dropped so the child never blocks on
/// a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, max_bytes: usize) -> Vec<u8> {
    let mut kept = Vec::new();
    let Some(mut reader) = reader else {
        return kept;
    };
    let keep = max_bytes.saturating_add(1);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = keep.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                debug!(error = %e, "output pipe closed with error");
                break;
            }
        }
    }
    kept
}

/// Decode captured bytes, cutting them at `max_bytes`
fn capture(bytes: &[u8], max_bytes: usize) -> String {
    if bytes.len() <= max_bytes {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut text = String::from_utf8_lossy(&bytes[..max_bytes]).into_owned();
    text.push_str(&format!(
        "\n[Output truncated - exceeded {}KB limit]",
        max_bytes / 1000
    ));
    text
}

/// Runs in the forked child, between `fork` and `exec`
#[cfg(unix)]
fn apply_rlimits(limits: &RunLimits) -> std::io::Result<()> {
    use nix::sys::resource::Resource;

    lower_limit(Resource::RLIMIT_CPU, limits.cpu_time_limit_secs)?;
    lower_limit(Resource::RLIMIT_FSIZE, limits.max_file_bytes)?;
    #[cfg(any(target_os = "linux", target_os = "android"))]
    if limits.max_memory_bytes > 0 {
        lower_limit(Resource::RLIMIT_AS, limits.max_memory_bytes)?;
    }
    Ok(())
}

/// Set soft and hard limit to `limit`, never above the current hard limit
#[cfg(unix)]
fn lower_limit(resource: nix::sys::resource::Resource, limit: u64) -> std::io::Result<()> {
    use nix::sys::resource::{getrlimit, setrlimit};

    let (_, hard) = getrlimit(resource)?;
    let limit = limit.min(hard);
    setrlimit(resource, limit, limit)?;
    Ok(())
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    // ESRCH just means every member is already gone
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid, error = %e, "process group kill skipped");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(timeout_ms: u64) -> (ProcessRunner, tempfile::TempDir) {
        let root = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            timeout_ms,
            ..RunLimits::default()
        };
        (ProcessRunner::new(limits, root.path()), root)
    }

    #[test]
    fn test_command_spec_builder() {
        let cmd = CommandSpec::new("javac")
            .with_args(["Main.java"])
            .with_work_dir("/tmp/box");
        assert_eq!(cmd.display(), "javac Main.java");
        assert_eq!(cmd.work_dir.as_deref(), Some(Path::new("/tmp/box")));
    }

    #[test]
    fn test_capture_truncates_long_output() {
        let bytes = vec![b'a'; 5_000];
        let text = capture(&bytes, 1_000);
        assert!(text.starts_with(&"a".repeat(1_000)));
        assert!(text.ends_with("[Output truncated - exceeded 1KB limit]"));

        assert_eq!(capture(b"short", 1_000), "short");
    }

    #[tokio::test]
    async fn test_read_capped_keeps_one_byte_past_the_cap() {
        let data = vec![b'x'; 1_000_000];
        let kept = read_capped(Some(&data[..]), 1_000).await;
        assert_eq!(kept.len(), 1_001);

        let kept = read_capped(Some(&b"tiny"[..]), 1_000).await;
        assert_eq!(kept, b"tiny");

        assert!(read_capped(None::<&[u8]>, 1_000).await.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported_not_raised() {
        let (runner, _root) = runner(2_000);
        let result = runner
            .execute(&CommandSpec::new("codetutor-no-such-binary-3f9a"))
            .await;

        assert!(!result.success);
        assert!(result.exit_code.is_none());
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("Execution failed:"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_captures_stdout() {
        let (runner, _root) = runner(5_000);
        let result = runner
            .execute(&CommandSpec::new("sh").with_args(["-c", "echo hello"]))
            .await;

        assert!(result.success);
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.exit_code, Some(0));
        assert!(result.error.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_failure_with_stderr() {
        let (runner, _root) = runner(5_000);
        let result = runner
            .execute(&CommandSpec::new("sh").with_args(["-c", "echo oops >&2; exit 3"]))
            .await;

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr.trim(), "oops");
        assert!(result.error.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let (runner, _root) = runner(300);
        let started = Instant::now();
        let result = runner
            .execute(&CommandSpec::new("sh").with_args(["-c", "while true; do :; done"]))
            .await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("timed out"));
        assert_eq!(result.elapsed_ms, 300);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_endless_output_is_drained_and_capped() {
        let root = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            timeout_ms: 10_000,
            max_output_bytes: 1_000,
            ..RunLimits::default()
        };
        let runner = ProcessRunner::new(limits, root.path());

        // 50 MB through the pipe; the child must not stall once the cap is hit
        let result = runner
            .execute(&CommandSpec::new("sh").with_args([
                "-c",
                "head -c 50000000 /dev/zero | tr '\\0' x",
            ]))
            .await;

        assert!(result.success);
        assert!(result.stdout.starts_with(&"x".repeat(1_000)));
        assert!(result.stdout.ends_with("[Output truncated - exceeded 1KB limit]"));
        assert!(result.stdout.len() < 1_100);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_size_limit_stops_large_writes() {
        let root = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            timeout_ms: 5_000,
            max_file_bytes: 10_000,
            ..RunLimits::default()
        };
        let runner = ProcessRunner::new(limits, root.path());

        let big = runner
            .execute(
                &CommandSpec::new("sh")
                    .with_args(["-c", "head -c 100000 /dev/zero > big.bin"])
                    .with_work_dir(root.path()),
            )
            .await;
        assert!(!big.success);
        let written = std::fs::metadata(root.path().join("big.bin")).unwrap().len();
        assert!(written <= 10_000);

        let small = runner
            .execute(
                &CommandSpec::new("sh")
                    .with_args(["-c", "head -c 1000 /dev/zero > small.bin"])
                    .with_work_dir(root.path()),
            )
            .await;
        assert!(small.success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cpu_limit_is_visible_to_child() {
        let root = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            cpu_time_limit_secs: 3,
            ..RunLimits::default()
        };
        let runner = ProcessRunner::new(limits, root.path());

        let result = runner
            .execute(&CommandSpec::new("sh").with_args(["-c", "ulimit -t"]))
            .await;

        assert!(result.success);
        assert_eq!(result.stdout.trim(), "3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_temp_vars_follow_work_dir() {
        let (runner, root) = runner(5_000);
        let work = tempfile::tempdir().unwrap();
        let result = runner
            .execute(
                &CommandSpec::new("sh")
                    .with_args(["-c", "printf '%s|%s' \"$HOME\" \"$TMPDIR\""])
                    .with_work_dir(work.path()),
            )
            .await;

        assert!(result.success);
        let (home, tmp) = result.stdout.split_once('|').unwrap();
        assert_eq!(Path::new(home), root.path());
        assert_eq!(Path::new(tmp), work.path());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_environment_points_at_sandbox_root() {
        let (runner, root) = runner(5_000);
        let result = runner
            .execute(&CommandSpec::new("sh").with_args(["-c", "printf %s \"$HOME\""]))
            .await;

        assert!(result.success);
        assert_eq!(Path::new(&result.stdout), root.path());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_work_dir_is_applied() {
        let (runner, _root) = runner(5_000);
        let work = tempfile::tempdir().unwrap();
        let result = runner
            .execute(
                &CommandSpec::new("sh")
                    .with_args(["-c", "pwd -P"])
                    .with_work_dir(work.path()),
            )
            .await;

        assert!(result.success);
        let expected = work.path().canonicalize().unwrap();
        assert_eq!(Path::new(result.stdout.trim()), expected.as_path());
    }
}
