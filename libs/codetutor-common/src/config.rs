use std::env;
use std::path::PathBuf;

/// Engine configuration
/// Provides defaults with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Wall-clock limit for one process invocation
    pub execution_timeout_ms: u64,
    /// Wall-clock limit for one runtime version probe
    pub probe_timeout_ms: u64,
    /// Cap on captured stdout/stderr, in bytes
    pub max_output_bytes: usize,
    /// CPU seconds per process (Unix `RLIMIT_CPU`)
    pub cpu_time_limit_secs: u64,
    /// Address space per process (Unix `RLIMIT_AS`), 0 disables it
    pub max_memory_bytes: u64,
    /// Largest file a process may write (Unix `RLIMIT_FSIZE`)
    pub max_file_bytes: u64,
    /// Parent directory of every per-invocation temp file or directory
    pub sandbox_root: PathBuf,
    pub course_path: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            execution_timeout_ms: parse_var("EXECUTION_TIMEOUT_MS").unwrap_or(10_000),
            probe_timeout_ms: parse_var("PROBE_TIMEOUT_MS").unwrap_or(5_000),
            max_output_bytes: parse_var("MAX_OUTPUT_BYTES").unwrap_or(100_000),
            cpu_time_limit_secs: parse_var("CPU_TIME_LIMIT_SECS").unwrap_or(10),
            max_memory_bytes: parse_var("MAX_MEMORY_BYTES").unwrap_or(0),
            max_file_bytes: parse_var("MAX_FILE_BYTES").unwrap_or(10 * 1024 * 1024),
            sandbox_root: env::var("SANDBOX_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("codetutor-sandbox")),
            course_path: env::var("COURSE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("content/course.json")),
            port: parse_var("PORT").unwrap_or(3000),
        }
    }

    pub fn new() -> Self {
        Self::from_env()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
