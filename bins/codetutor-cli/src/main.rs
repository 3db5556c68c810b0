mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codetutor_common::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codetutor-cli")]
#[command(about = "CodeTutor CLI - Run code, grade answers and inspect toolchains", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a source file once and print its output
    Run {
        /// Language identifier (e.g., python, js, java, c#)
        #[arg(short, long)]
        language: String,

        /// Source file to execute
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Grade an answer against a challenge from a course file
    Submit {
        /// Course JSON file (defaults to COURSE_PATH)
        #[arg(long)]
        course: Option<PathBuf>,

        /// Lesson id
        #[arg(short, long)]
        lesson: String,

        /// Challenge id within the lesson
        #[arg(short, long)]
        challenge: String,

        #[command(flatten)]
        answer: commands::AnswerArgs,
    },

    /// List lessons and challenge ids of a course file
    Lessons {
        /// Course JSON file (defaults to COURSE_PATH)
        #[arg(long)]
        course: Option<PathBuf>,
    },

    /// Probe installed language toolchains
    Runtimes,

    /// Report common structural mistakes in a source file without running it
    Check {
        /// Language identifier
        #[arg(short, long)]
        language: String,

        /// Source file to check
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Engine logs stay quiet unless RUST_LOG asks for them
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Run { language, file } => {
            commands::run_file(&config, &language, &file).await?;
        }
        Commands::Submit {
            course,
            lesson,
            challenge,
            answer,
        } => {
            let course = course.unwrap_or_else(|| config.course_path.clone());
            commands::submit_answer(&config, &course, &lesson, &challenge, &answer).await?;
        }
        Commands::Lessons { course } => {
            let course = course.unwrap_or_else(|| config.course_path.clone());
            commands::list_lessons(&course).await?;
        }
        Commands::Runtimes => {
            commands::list_runtimes(&config).await?;
        }
        Commands::Check { language, file } => {
            commands::check_file(&language, &file)?;
        }
    }

    Ok(())
}
