use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lullaby_core::analysis::{ClassificationResult, CryAnalyzer, FeatureExtractor};
use lullaby_core::config::AppConfig;
use lullaby_core::context::{StaticContext, SystemClock};
use lullaby_core::fixtures::{ExpectationDiff, FixtureCatalog, FixtureOutcome, FixtureProcessor};
use lullaby_core::history::{
    spawn_history_worker, HistoryRecorder, HistorySink, HistoryWorker, JsonFileHistory,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "lullaby_cli",
    about = "Cry analysis harness: analyze recordings, run fixtures, inspect history"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// JSON config file (defaults to config/lullaby.json, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a recording and print the result as JSON
    Analyze {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        hours_since_feeding: Option<f64>,
        #[arg(long)]
        minutes_since_wake: Option<f64>,
        /// Append the result to this JSON history file
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Print the extracted feature vector for a recording
    Features {
        #[arg(long)]
        file: PathBuf,
    },
    /// Run a fixture classification and optionally compare against expectations
    Classify {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List available fixtures on disk
    DumpFixtures,
    /// Print or clear a JSON history file
    History {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);

    match cli.command {
        Commands::Analyze {
            file,
            hours_since_feeding,
            minutes_since_wake,
            history,
        } => {
            let context = StaticContext {
                hours_since_last_feeding: hours_since_feeding,
                minutes_since_last_wake: minutes_since_wake,
            };
            let history = history.or_else(|| config.history.path.clone());
            run_analyze(&config, &file, context, history)
        }
        Commands::Features { file } => run_features(&config, &file),
        Commands::Classify {
            fixture,
            expect,
            output,
        } => run_classify(&config, &catalog, &fixture, expect, output),
        Commands::DumpFixtures => run_dump(&catalog),
        Commands::History { path, clear } => {
            let path = path
                .or_else(|| config.history.path.clone())
                .context("no history file given; pass --path or set history.path")?;
            run_history(&config, &path, clear)
        }
    }
}

fn run_analyze(
    config: &AppConfig,
    file: &Path,
    context: StaticContext,
    history_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let context = Arc::new(context);
    let mut analyzer = CryAnalyzer::new(config)
        .with_feeding_context(context.clone())
        .with_sleep_context(context);

    let mut worker = None;
    let mut recorder = None;
    if let Some(path) = history_path {
        let sink = Arc::new(JsonFileHistory::new(path, config.history.capacity));
        let (history, history_worker) = spawn_history_worker(sink, Arc::new(SystemClock))
            .context("starting history worker")?;
        analyzer = analyzer.with_history(history.clone());
        recorder = Some(history);
        worker = Some(history_worker);
    }

    let result = analyzer.analyze_file(file);
    finish_history(recorder, worker);

    print_json(&result)?;
    Ok(ExitCode::from(0))
}

/// Drain pending history appends and stop the worker
///
/// History is a side channel: a failed flush is logged and the
/// classification is still printed. Returns whether the flush succeeded.
fn finish_history(recorder: Option<HistoryRecorder>, worker: Option<HistoryWorker>) -> bool {
    let flushed = match recorder {
        Some(recorder) => match recorder.flush() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "history flush failed; result not persisted");
                false
            }
        },
        None => true,
    };
    if let Some(worker) = worker {
        worker.shutdown();
    }
    flushed
}

fn run_features(config: &AppConfig, file: &Path) -> Result<ExitCode> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let report = FeatureExtractor::new(config.extraction.clone()).report(&bytes);
    print_json(&report)?;
    Ok(ExitCode::from(0))
}

fn run_classify(
    config: &AppConfig,
    catalog: &FixtureCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let processor = FixtureProcessor::new(config.clone());
    let data = catalog.load(fixture, override_expect)?;
    let outcome = processor.run(&data);

    emit_report(&data.metadata.name, &outcome, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&outcome.result) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn run_history(config: &AppConfig, path: &Path, clear: bool) -> Result<ExitCode> {
    let sink = JsonFileHistory::new(path, config.history.capacity);
    if clear {
        sink.clear()
            .with_context(|| format!("clearing {}", path.display()))?;
        return Ok(ExitCode::from(0));
    }

    let entries = sink
        .list()
        .with_context(|| format!("reading {}", path.display()))?;
    print_json(&entries)?;
    Ok(ExitCode::from(0))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit_report(
    fixture: &str,
    outcome: &FixtureOutcome,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let report = FixtureReportPayload {
        fixture,
        features: outcome.report,
        result: &outcome.result,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct FixtureReportPayload<'a> {
    fixture: &'a str,
    features: Option<lullaby_core::analysis::FeatureReport>,
    result: &'a ClassificationResult,
}
