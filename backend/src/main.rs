use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use plan_insight::Config;
use plan_insight::services::llm::{LLMAnalysisRequestTrait, LLMPromptEnvelope, PlanSummaryReq};
use plan_insight::services::{FilePlanSource, PlanAnalyzer, PlanSource, analyze_from_source};
use plan_insight::utils::{AppError, AppResult, format_report_text, init_logging};

#[derive(Parser)]
#[command(name = "plan-insight", version, about = "Analyze PostgreSQL EXPLAIN ANALYZE output")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a plan and print the analysis report
    Analyze {
        /// Plan file: text output, a JSON fragment map, or a JSON plan
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the summarization prompt for a plan
    Prompt {
        file: PathBuf,

        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        database: Option<String>,

        #[arg(long)]
        status: Option<String>,

        /// Print scenario, cache key, system prompt and user prompt as JSON
        #[arg(long)]
        envelope: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> ExitCode {
    // Load .env before configuration so APP_* overrides apply
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::from(1);
        },
    };

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code() as u8);
        },
    };

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        },
    }
}

fn run(cli: Cli, config: &Config) -> AppResult<()> {
    let analyzer = PlanAnalyzer::with_limits(config.analyzer_limits());

    match cli.command {
        Command::Analyze { file, format } => {
            if !file.is_file() {
                return Err(AppError::plan_not_found(file.display().to_string()));
            }
            let (source, request) = FilePlanSource::for_file(&file)?;
            let report = analyze_from_source(&source, &request, &analyzer);

            let output = match format {
                OutputFormat::Json if config.output.pretty => serde_json::to_string_pretty(&report)?,
                OutputFormat::Json => serde_json::to_string(&report)?,
                OutputFormat::Text => format_report_text(&report),
            };
            println!("{}", output.trim_end());
        },
        Command::Prompt { file, query, database, status, envelope } => {
            let (source, request) = FilePlanSource::for_file(&file)?;
            let payload = source
                .fetch(&request)?
                .ok_or_else(|| AppError::plan_not_found(file.display().to_string()))?;
            let report = analyzer.analyze(Some(&payload))?;

            let req = PlanSummaryReq::from_report(&report, query, database, status);
            if envelope {
                let envelope = LLMPromptEnvelope::from_request(&req);
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                tracing::debug!("Prompt cache key {}", req.cache_key());
                println!("{}", req.user_prompt());
            }
        },
    }

    Ok(())
}
