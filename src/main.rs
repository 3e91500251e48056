// --- Generador de combinaciones de horario - binario ---
use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use combishift::api_json::{load_candidates, parse_json_input, SolveResponse};
use combishift::{generate_and_rank, report, EngineConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Rank every conflict-free combination of sections for a course selection.
#[derive(Debug, Parser)]
#[command(name = "combishift", version)]
struct Cli {
    /// Request JSON (courses, preferences, catalog source).
    #[arg(long)]
    request: PathBuf,

    /// Engine config JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `top_k` from config and environment.
    #[arg(long)]
    top_k: Option<usize>,

    /// Worker threads; 0 = one per CPU.
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("COMBISHIFT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = EngineConfig::load(cli.config.as_deref())?;
    if let Some(k) = cli.top_k {
        cfg.top_k = k;
    }
    if let Some(w) = cli.workers {
        cfg.search.workers = w;
    }
    cfg.validate()?;

    let raw = std::fs::read_to_string(&cli.request)?;
    let params = parse_json_input(&raw)?;
    let base_dir = cli.request.parent();
    let candidates = load_candidates(&params, base_dir, cfg.search.order_by_enrollment)?;
    info!(courses = params.courses.len(), loaded = candidates.len(), "catalog snapshot ready");

    let results = generate_and_rank(&params.selection(), &candidates, &cfg.scoring, cfg.top_k, &cfg.search.budget())?;

    match cli.format {
        Format::Text => print!("{}", report::render_text(&results)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&SolveResponse::from_results(&results))?),
    }
    Ok(())
}
