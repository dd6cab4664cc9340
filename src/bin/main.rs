//! podium CLI - Natural-language analytics over motorsport statistics
//!
//! Usage:
//!   podium serve [--host <host>] [--port <port>]
//!   podium analyze <query>
//!   podium normalize <file.json>
//!   podium history [--limit <n>]
//!
//! Examples:
//!   podium serve --port 8080
//!   podium analyze "How many points did Ferrari score in 2021?"
//!   podium normalize standings.json

use clap::{Parser, Subcommand};
use podium::analysis::{prepare_table, AnalysisRequest, Analyzer, AnalyzerConfig};
use podium::collaborators::Collaborators;
use podium::config::Settings;
use podium::history::HistoryStore;
use podium::worker::{WorkerBackend, WorkerClient};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "podium")]
#[command(about = "podium - Natural-language analytics over motorsport statistics")]
#[command(version)]
struct Cli {
    /// Config file (overrides PODIUM_CONFIG and the default locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analysis API over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one analysis and print the response as JSON
    Analyze {
        /// The question to answer
        query: String,
    },

    /// Clean a pipeline payload file and print the resulting records
    Normalize {
        /// JSON file holding a table, a record, a list of records, or {"results": ...}
        file: PathBuf,
    },

    /// Show recent requests
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    podium::logging::init(&settings.logging);

    match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => cmd_serve(settings, host, port).await,
        Commands::Analyze { query } => cmd_analyze(settings, query).await,
        Commands::Normalize { file } => cmd_normalize(&settings, file),
        Commands::History { limit } => cmd_history(&settings, limit).await,
    }
}

/// Spawn the worker and assemble an analyzer, with history if enabled.
async fn build_analyzer(settings: &Settings) -> Result<Analyzer, String> {
    let client = WorkerClient::spawn_with_settings(settings)
        .await
        .map_err(|e| format!("Failed to start analyst worker: {}", e))?;
    let backend = Arc::new(WorkerBackend::new(Arc::new(client)));
    let analyzer = Analyzer::new(
        Collaborators::with_backend(backend),
        AnalyzerConfig::from_settings(settings),
    );

    if !settings.history.enabled {
        return Ok(analyzer);
    }
    match settings.history_path().map(HistoryStore::open) {
        Ok(Ok(store)) => Ok(analyzer.with_history(store)),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "request history disabled");
            Ok(analyzer)
        }
        Err(e) => {
            tracing::warn!(error = %e, "request history disabled");
            Ok(analyzer)
        }
    }
}

#[cfg(feature = "server")]
async fn cmd_serve(settings: Settings, host: Option<String>, port: Option<u16>) -> ExitCode {
    let analyzer = match build_analyzer(&settings).await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    match podium::web::serve(analyzer, &host, port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_analyze(settings: Settings, query: String) -> ExitCode {
    let analyzer = match build_analyzer(&settings).await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let response = analyzer.analyze(AnalysisRequest::new(query)).await;
    print_json(&response.to_value());

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_normalize(settings: &Settings, file: PathBuf) -> ExitCode {
    let source = match fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let payload: Value = match serde_json::from_str(&source) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON in '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let payload = match &payload {
        Value::Object(map) => map.get("results").unwrap_or(&payload),
        other => other,
    };

    match prepare_table(payload, &settings.normalize, &settings.expand_config()) {
        Ok(table) => {
            print_json(&Value::Array(
                table.to_records().into_iter().map(Value::Object).collect(),
            ));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_history(settings: &Settings, limit: usize) -> ExitCode {
    let store = match settings.history_path().map(HistoryStore::open) {
        Ok(Ok(store)) => store,
        Ok(Err(e)) => {
            eprintln!("History error: {}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match store.recent(limit).await {
        Ok(entries) if entries.is_empty() => {
            println!("No requests recorded.");
            ExitCode::SUCCESS
        }
        Ok(entries) => {
            for entry in entries {
                let status = if entry.success { "ok  " } else { "FAIL" };
                println!("{:>5}  {}  {}  {}", entry.id, entry.created_at, status, entry.query);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("History error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}
