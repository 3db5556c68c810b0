pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod factory;
pub mod inject;
pub mod normalize;
pub mod precheck;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod store;

pub use dispatcher::LanguageDispatcher;
pub use engine::CodeExecutor;
pub use error::{EngineError, Result};
pub use factory::{parse_challenge_type, submit};
pub use probe::{RuntimeAvailability, RuntimeInfo};
pub use progress::{ProgressRecorder, TracingProgressRecorder};
pub use runner::{CommandRunner, CommandSpec, ProcessRunner, RunLimits};
pub use store::{CourseStore, JsonCourseStore};
