//! CLI entry point: load a CSV, apply actions in order, optionally write the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cleanly::config::CleaningConfig;
use cleanly::observability::{
    CompositeObserver, FileObserver, Observer, Severity, StdErrObserver, TracingObserver,
};
use cleanly::processing::stats::{ColumnSummary, CorrelationMatrix, Histogram, Overview};
use cleanly::session::{Action, ActionOutput, Session, SessionOptions};
use cleanly::types::DataSet;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean tabular CSV data: duplicates, missing values, outliers",
    long_about = "Loads a CSV file, applies ACTIONS in order and prints their results.\n\n\
                  ACTIONS:\n  \
                  overview, describe, correlation        reports\n  \
                  clean, dedupe, impute                  duplicates and missing values\n  \
                  zscore[=T], iqr[=K]                    outlier removal\n  \
                  normalize, encode                      rescale / encode categoricals\n  \
                  drop=a,b  rename=old:new               column edits\n  \
                  filter=col=value  sort=col[:desc]      row edits\n  \
                  group=by:col:mean|sum|count|max|min    aggregation\n  \
                  histogram=col[:bins]  counts=col       distributions\n\n\
                  EXAMPLES:\n  \
                  cleanly sales.csv overview clean iqr -o sales_clean.csv\n  \
                  cleanly sales.csv zscore=2.5 group=city:price:mean --json"
)]
struct Args {
    /// Path to the CSV file to load
    input: PathBuf,

    /// Actions to apply, in order
    actions: Vec<String>,

    /// Write the final dataset to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with `z_threshold`, `iqr_multiplier`, `histogram_bins`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append operation events to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print each action's output as one JSON document per line
    ///
    /// Disables logging so stdout only carries JSON.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber. Nothing is logged in JSON mode.
fn init_logging(level: &str, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    // Parse every action up front so a typo fails before any work is done.
    let actions = args
        .actions
        .iter()
        .map(|token| {
            token
                .parse::<Action>()
                .with_context(|| format!("invalid action '{token}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let config = match &args.config {
        Some(path) => CleaningConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CleaningConfig::default(),
    };

    let options = SessionOptions {
        config,
        observer: Some(build_observer(args.log_file.as_deref(), args.json)),
        alert_at_or_above: Severity::Critical,
    };

    let mut session = Session::open(&args.input, options)
        .with_context(|| format!("loading {}", args.input.display()))?;
    info!(
        "Loaded {}: {} rows x {} columns",
        args.input.display(),
        session.dataset().row_count(),
        session.dataset().column_count()
    );

    for action in &actions {
        let output = session
            .apply(action)
            .with_context(|| format!("action '{}' failed", action.name()))?;
        if args.json {
            println!("{}", serde_json::json!({ "action": action.name(), "output": output }));
        } else {
            print_output(action, &output, session.dataset());
        }
    }

    if let Some(path) = &args.output {
        session
            .export(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {} rows to {}", session.dataset().row_count(), path.display());
    }

    Ok(())
}

/// Events go to `tracing`, or straight to stderr in JSON mode where no subscriber is installed.
fn build_observer(log_file: Option<&Path>, json_output: bool) -> Arc<dyn Observer> {
    let console: Arc<dyn Observer> = if json_output {
        Arc::new(StdErrObserver)
    } else {
        Arc::new(TracingObserver)
    };
    match log_file {
        Some(path) => {
            let file: Arc<dyn Observer> = Arc::new(FileObserver::new(path));
            Arc::new(CompositeObserver::new(vec![console, file]))
        }
        None => console,
    }
}

/// Human-readable rendering of one action's output.
///
/// Uses `println!` on purpose: this is the primary output, independent of the log level.
fn print_output(action: &Action, output: &ActionOutput, current: &DataSet) {
    println!("\n== {} ==", action.name());
    match output {
        ActionOutput::Replaced {
            rows_before,
            rows_after,
        } => {
            println!("rows: {rows_before} -> {rows_after}");
            print_table(current, 5);
        }
        ActionOutput::Overview(o) => print_overview(o),
        ActionOutput::Describe(summaries) => print_describe(summaries),
        ActionOutput::Correlation(m) => print_correlation(m),
        ActionOutput::Grouped(ds) => print_table(ds, usize::MAX),
        ActionOutput::Histogram(h) => print_histogram(h),
        ActionOutput::ValueCounts { column, counts } => {
            println!("{:<24} {:>8}", column, "count");
            for (value, n) in counts {
                println!("{:<24} {:>8}", truncate_str(value, 23), n);
            }
        }
    }
}

fn print_overview(o: &Overview) {
    println!("rows: {}  columns: {}  duplicate rows: {}", o.rows, o.columns, o.duplicate_rows);
    if o.missing.is_empty() {
        println!("no missing values");
    }
    for (column, n) in &o.missing {
        println!("  missing {:<20} {n}", truncate_str(column, 19));
    }
}

fn print_describe(summaries: &[ColumnSummary]) {
    println!(
        "{:<16} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in summaries {
        println!(
            "{:<16} {:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
            truncate_str(&s.column, 15),
            s.count,
            s.mean,
            s.std,
            s.min,
            s.q25,
            s.median,
            s.q75,
            s.max
        );
    }
}

fn print_correlation(m: &CorrelationMatrix) {
    print!("{:<12}", "");
    for c in &m.columns {
        print!(" {:>10}", truncate_str(c, 10));
    }
    println!();
    for (name, row) in m.columns.iter().zip(&m.values) {
        print!("{:<12}", truncate_str(name, 11));
        for v in row {
            print!(" {v:>10.3}");
        }
        println!();
    }
}

fn print_histogram(h: &Histogram) {
    let peak = h.counts.iter().copied().max().unwrap_or(0).max(1);
    for (i, n) in h.counts.iter().enumerate() {
        let bar = "#".repeat(n * 40 / peak);
        println!("[{:>10.3}, {:>10.3}) {:>6} {bar}", h.edges[i], h.edges[i + 1], n);
    }
}

fn print_table(ds: &DataSet, max_rows: usize) {
    let header: Vec<String> = ds
        .schema
        .field_names()
        .map(|n| format!("{:>12}", truncate_str(n, 12)))
        .collect();
    println!("{}", header.join(" "));
    for row in ds.rows.iter().take(max_rows) {
        let cells: Vec<String> = row
            .iter()
            .map(|v| format!("{:>12}", truncate_str(&v.to_string(), 12)))
            .collect();
        println!("{}", cells.join(" "));
    }
    if ds.row_count() > max_rows {
        println!("... {} more rows", ds.row_count() - max_rows);
    }
}

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}
