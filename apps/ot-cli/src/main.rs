use clap::{Parser, Subcommand};
use ot_app::{
    AppError, AppResult, HistorySource, LiveMonitor, MonitorConfig, ResidualLogSummary,
    export_table, load_cases, load_config, load_residuals, query,
};
use ot_trace::{SolverKind, TableColumns, episodes_to_series};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "ot-cli")]
#[command(about = "Optimization trace tool - convert, stack and watch optimizer histories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one case store to a flat table
    Convert {
        /// Path to the case store (JSON lines)
        recorder: PathBuf,
        /// Output file; `.dat` writes a point table, anything else CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Stack restart runs into one history and export it
    Stack {
        /// Case stores in run order
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,
        /// Output file (defaults to the first input with a `.dat` extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Split a solver log into residual episodes
    Residuals {
        /// Captured solver output
        log: PathBuf,
        /// Skip nonlinear block Gauss-Seidel residuals
        #[arg(long)]
        no_nlbgs: bool,
        /// Skip linear block Gauss-Seidel residuals
        #[arg(long)]
        no_lnbgs: bool,
        /// Export each solver's series with this extension (e.g. dat, csv)
        #[arg(short, long)]
        output_ext: Option<String>,
    },
    /// Summarize the history of one or more stacked case stores
    Show {
        /// Case stores in run order
        #[arg(required = true)]
        recorders: Vec<PathBuf>,
        /// Print the values of one column
        #[arg(long)]
        column: Option<String>,
    },
    /// Poll a history and print new iterations as JSON lines
    Watch {
        /// Monitor configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Case stores to watch (overrides the configured source)
        #[arg(long)]
        recorder: Vec<PathBuf>,
        /// Refresh interval in seconds
        #[arg(long)]
        interval: Option<f64>,
        /// Leave design variables out of the delta
        #[arg(long)]
        no_dvs: bool,
        /// Stop after this many polls
        #[arg(long)]
        max_polls: Option<usize>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { recorder, output } => cmd_convert(&recorder, output.as_deref()),
        Commands::Stack { input, output } => cmd_stack(&input, output.as_deref()),
        Commands::Residuals {
            log,
            no_nlbgs,
            no_lnbgs,
            output_ext,
        } => cmd_residuals(&log, !no_nlbgs, !no_lnbgs, output_ext.as_deref()),
        Commands::Show { recorders, column } => cmd_show(&recorders, column.as_deref()),
        Commands::Watch {
            config,
            recorder,
            interval,
            no_dvs,
            max_polls,
        } => cmd_watch(config.as_deref(), recorder, interval, no_dvs, max_polls),
    }
}

fn cmd_convert(recorder: &Path, output: Option<&Path>) -> AppResult<()> {
    cmd_stack(&[recorder.to_path_buf()], output)
}

fn cmd_stack(inputs: &[PathBuf], output: Option<&Path>) -> AppResult<()> {
    let Some(first) = inputs.first() else {
        return Err(AppError::InvalidInput("no case stores given".to_string()));
    };
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| first.with_extension("dat"));

    let history = load_cases(inputs)?;
    let table = history.flat_table(TableColumns::default())?;
    export_table(&table, &output)?;

    println!(
        "✓ Exported {} iterations from {} run(s) to {}",
        table.len(),
        inputs.len(),
        output.display()
    );
    Ok(())
}

fn cmd_residuals(
    log: &Path,
    nonlinear: bool,
    linear: bool,
    output_ext: Option<&str>,
) -> AppResult<()> {
    let kinds = [
        (SolverKind::Nonlinear, nonlinear),
        (SolverKind::Linear, linear),
    ];
    for (kind, _) in kinds.iter().filter(|(_, enabled)| *enabled) {
        let episodes = load_residuals(log, *kind)?;
        print_residual_summary(&query::summarize_residuals(*kind, &episodes));

        if let Some(ext) = output_ext {
            let series = episodes_to_series(&episodes)?;
            let output = residual_output_path(log, *kind, ext);
            export_table(&series, &output)?;
            println!("  ✓ Exported to {}", output.display());
        }
    }
    Ok(())
}

fn residual_output_path(log: &Path, kind: SolverKind, ext: &str) -> PathBuf {
    let stem = log
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    log.with_file_name(format!("{}_{}.{}", stem, kind.label(), ext))
}

fn print_residual_summary(summary: &ResidualLogSummary) {
    println!(
        "{}: {} episode(s), {} record(s)",
        summary.kind.label(),
        summary.episodes.len(),
        summary.total_records
    );
    for episode in &summary.episodes {
        match (episode.final_absolute, episode.final_relative) {
            (Some(abs), Some(rel)) => println!(
                "  episode {}: {} iterations, final abs {:.3e}, rel {:.3e}",
                episode.index, episode.records, abs, rel
            ),
            _ => println!("  episode {}: empty", episode.index),
        }
    }
}

fn cmd_show(recorders: &[PathBuf], column: Option<&str>) -> AppResult<()> {
    let history = load_cases(recorders)?;
    let table = history.flat_table(TableColumns::default())?;

    if let Some(name) = column {
        for (iteration, value) in query::extract_column(&table, name)? {
            println!("{},{}", iteration, value);
        }
        return Ok(());
    }

    let summary = query::summarize_history(&table);
    println!("History Summary:");
    println!("  Cases: {}", history.case_count());
    println!("  Iterations: {}", summary.record_count);
    if let Some((first, last)) = summary.iteration_range {
        println!("  Iteration range: {} - {}", first, last);
    }
    for (role, names) in &summary.columns_by_role {
        println!("\n{}:", role);
        for name in names {
            println!("  {}", name);
        }
    }
    Ok(())
}

fn cmd_watch(
    config_path: Option<&Path>,
    recorders: Vec<PathBuf>,
    interval: Option<f64>,
    no_dvs: bool,
    max_polls: Option<usize>,
) -> AppResult<()> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };
    if !recorders.is_empty() {
        config.source = HistorySource::Cases { paths: recorders };
    }
    if let Some(seconds) = interval {
        config.refresh_interval_s = seconds;
    }
    if no_dvs {
        config.include_design_vars = false;
    }

    let mut monitor = LiveMonitor::from_config(&config)?;
    info!(
        source = ?monitor.source(),
        interval_s = config.refresh_interval_s,
        "watching history"
    );

    let polls = monitor.run(config.refresh_interval(), max_polls, |delta| {
        let line = serde_json::to_string(delta).map_err(std::io::Error::from)?;
        println!("{}", line);
        Ok(())
    })?;
    info!(polls, "watch finished");
    Ok(())
}
