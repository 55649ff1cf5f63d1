mod analysis;
mod config;
mod document;
mod errors;
mod index;
mod llm_client;
mod models;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::{AnalysisOrchestrator, AnalysisRequest, SkillSource};
use crate::analysis::report;
use crate::config::{validate_cutoff, Config};
use crate::document::chunker::ChunkProfile;
use crate::document::{extract_text, ResumeDocument, UploadedDocument};
use crate::errors::AppError;
use crate::index::store::IndexStore;
use crate::llm_client::LlmClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scores a resume against a job's required skills")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a resume against a job description or an explicit skill list
    Analyze(AnalyzeArgs),
    /// Show the skills extracted from a job description
    ExtractSkills {
        /// Job description (.pdf or .txt)
        job_description: PathBuf,
    },
    /// Show how a document is chunked for indexing
    Chunks {
        /// Document (.pdf or .txt)
        document: PathBuf,
        #[arg(long, value_enum, default_value_t = Profile::Compact)]
        profile: Profile,
    },
    /// Delete persisted similarity index artifacts
    ClearIndexes,
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Resume (.pdf or .txt)
    resume: PathBuf,
    /// Job description to extract the target skills from (.pdf or .txt)
    #[arg(long)]
    job_description: Option<PathBuf>,
    /// Comma-separated target skills, e.g. "Python, Docker, SQL"
    #[arg(long)]
    skills: Option<String>,
    /// Minimum overall score (0-100) for a RECOMMENDED verdict
    #[arg(long, default_value_t = 75)]
    cutoff: u32,
    /// Write JSON and text exports here instead of printing the report
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    /// 500-char windows over the indexed resume prefix
    Compact,
    /// 1000-char windows over the whole text
    Detailed,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error [{}]: {e}", e.code());
            return ExitCode::from(e.exit_code());
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {e}", e.code());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(command: Commands, config: &Config) -> Result<(), AppError> {
    match command {
        Commands::Analyze(args) => analyze(args, config).await,
        Commands::ExtractSkills { job_description } => {
            let orchestrator = build_orchestrator(config)?;
            let document = UploadedDocument::from_path(&job_description).await?;
            let skills = orchestrator
                .resolve_skills(SkillSource::JobDescription(document))
                .await?;
            if skills.is_empty() {
                println!("No skills could be extracted.");
            }
            for skill in skills {
                println!("{skill}");
            }
            Ok(())
        }
        Commands::Chunks { document, profile } => print_chunks(&document, profile, config).await,
        Commands::ClearIndexes => {
            let store = IndexStore::new(config.index_dir.clone(), config.index_retention);
            let removed = store
                .clear()
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            println!("Removed {removed} index artifacts from {}", store.root().display());
            Ok(())
        }
    }
}

async fn analyze(args: AnalyzeArgs, config: &Config) -> Result<(), AppError> {
    let cutoff_score = validate_cutoff(args.cutoff)?;
    let orchestrator = build_orchestrator(config)?;

    let resume = UploadedDocument::from_path(&args.resume).await?;
    let job_description = match &args.job_description {
        Some(path) => Some(UploadedDocument::from_path(path).await?),
        None => None,
    };
    let skills = SkillSource::from_inputs(job_description, args.skills.as_deref())?;

    let result = orchestrator
        .analyze(AnalysisRequest {
            resume,
            skills,
            cutoff_score,
        })
        .await?;

    let generated_at = Local::now().naive_local();
    let text = report::to_text(&result, generated_at);

    match args.output_dir {
        Some(dir) => {
            let json = report::to_json(&result).map_err(|e| AppError::Internal(e.into()))?;
            tokio::fs::create_dir_all(&dir).await?;

            let json_path = dir.join(report::export_file_name("json", generated_at));
            let text_path = dir.join(report::export_file_name("txt", generated_at));
            tokio::fs::write(&json_path, json).await?;
            tokio::fs::write(&text_path, &text).await?;

            println!(
                "Overall score {}% ({})",
                result.overall_score,
                if result.selected {
                    "RECOMMENDED"
                } else {
                    "NOT RECOMMENDED"
                }
            );
            println!("Wrote {}", json_path.display());
            println!("Wrote {}", text_path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Wires the LLM client into a fresh orchestrator. Fails without an API key.
fn build_orchestrator(config: &Config) -> Result<AnalysisOrchestrator, AppError> {
    let client = LlmClient::new(config.api_key()?.to_string(), &config.llm)
        .map_err(|e| AppError::Internal(e.into()))?;
    info!("LLM client initialized (model: {})", client.chat_model());

    let client = Arc::new(client);
    Ok(AnalysisOrchestrator::new(
        client.clone(),
        client,
        IndexStore::new(config.index_dir.clone(), config.index_retention),
        config.limits,
        config.llm.call_timeout,
    ))
}

async fn print_chunks(path: &Path, profile: Profile, config: &Config) -> Result<(), AppError> {
    let document = UploadedDocument::from_path(path).await?;
    let resume = ResumeDocument::new(&extract_text(&document).await?)?;

    let chunks = match profile {
        Profile::Compact => resume.chunks(ChunkProfile::COMPACT, config.limits.index_source_chars),
        Profile::Detailed => resume.chunks(ChunkProfile::DETAILED, usize::MAX),
    };

    for (i, chunk) in chunks.iter().enumerate() {
        println!("--- chunk {} ({} chars) ---", i + 1, chunk.chars().count());
        println!("{chunk}");
    }
    Ok(())
}
