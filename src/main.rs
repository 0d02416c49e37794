// 🧬 Occurrence Interpreter CLI
//
//   interpret <occurrences.csv>                 → interpreted records, JSON lines on stdout
//   cluster <pairs.csv> <interpreted.jsonl>     → clusters with representatives, JSON lines
//   summary <interpreted.jsonl>                 → issue report
//
// Logs go to stderr (RUST_LOG controls the level) so stdout stays machine-readable.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use occurrence_interpreter::{
    load_csv, load_pairs, ClusterRecord, ClusterStrategy, DeduplicationEngine, InterpretedRecord,
    InterpreterConfig, OccurrenceInterpreter, QualitySummary,
};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "occurrence-interpreter")]
#[command(version, about = "Interpret raw biodiversity occurrence records")]
struct Cli {
    /// TOML config file (falls back to OCCURRENCE_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a CSV of raw occurrence rows
    Interpret {
        /// CSV with Darwin Core headers
        input: PathBuf,
    },

    /// Cluster duplicate pairs and pick a representative per cluster
    Cluster {
        /// CSV with id1,id2 columns
        pairs: PathBuf,

        /// Output of `interpret`
        records: PathBuf,

        /// first-match or transitive (overrides config)
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// Print an issue report for interpreted records
    Summary {
        /// Output of `interpret`
        records: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = InterpreterConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Interpret { input } => run_interpret(&config, &input),
        Commands::Cluster {
            pairs,
            records,
            strategy,
        } => run_cluster(&config, &pairs, &records, strategy.as_deref()),
        Commands::Summary { records } => run_summary(&records),
    }
}

fn run_interpret(config: &InterpreterConfig, input: &Path) -> Result<()> {
    let rows = load_csv(input)?;

    let interpreter = OccurrenceInterpreter::from_config(config)?;
    let records = interpreter.interpret_batch(&rows);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    tracing::info!("{}", QualitySummary::from_records(&records).summary());
    Ok(())
}

fn run_cluster(
    config: &InterpreterConfig,
    pairs_path: &Path,
    records_path: &Path,
    strategy: Option<&str>,
) -> Result<()> {
    let strategy = match strategy {
        Some(name) => ClusterStrategy::from_name(name)
            .with_context(|| format!("Unknown cluster strategy: {}", name))?,
        None => config.clustering.strategy,
    };

    let pairs = load_pairs(pairs_path)?;
    let records: Vec<ClusterRecord> = read_records(records_path)?
        .iter()
        .map(ClusterRecord::from_interpretation)
        .collect();

    let engine = DeduplicationEngine::with_strategy(strategy);
    let summaries = engine.summarize(&pairs, &records)?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for summary in &summaries {
        serde_json::to_writer(&mut out, summary)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn run_summary(records_path: &Path) -> Result<()> {
    let records = read_records(records_path)?;
    let summary = QualitySummary::from_records(&records);

    println!("📊 Interpretation Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Records:         {}", summary.total_records);
    println!("   Clean:           {} ({:.1}%)", summary.clean_records, summary.clean_ratio() * 100.0);
    println!("   Located:         {}", summary.location_success_count);
    println!("   With event date: {}", summary.with_event_date_count);
    println!();

    if summary.issue_counts.is_empty() {
        println!("✅ No issues raised");
        return Ok(());
    }

    println!("⚠️  Issues (records affected):");
    for (issue_type, count) in &summary.issue_counts {
        println!("   {:<40} {}", issue_type.as_str(), count);
    }
    Ok(())
}

/// Read interpreted records written by `interpret`, one JSON object per line
fn read_records(path: &Path) -> Result<Vec<InterpretedRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open records file: {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: InterpretedRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid record on line {}", index + 1))?;
        records.push(record);
    }
    Ok(records)
}
