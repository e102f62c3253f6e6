use anyhow::{Context, Result};
use clap::Parser;
use colorstat::cli::{Cli, Command, OutputFormat};
use colorstat::config::AnalysisConfig;
use colorstat::orchestrator::{DataKind, DatasetOrchestrator};
use colorstat::report::{self, TextReport};
use colorstat::store::AggregationStore;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE, otherwise RUST_LOG
/// (default `warn`) decides
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print a result in the requested format
fn emit<T: TextReport + Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => value.write_text(&mut out)?,
        OutputFormat::Json => writeln!(out, "{}", report::to_json(value)?)?,
    }
    Ok(())
}

fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;
    let orchestrator = DatasetOrchestrator::new(config)?;

    match &args.command {
        Command::Perf { run, files } => {
            let mut store = AggregationStore::new();
            let summary = if files.is_empty() {
                orchestrator.perf_run(&run.parameters(DataKind::Perf), &mut store)?
            } else {
                orchestrator.summarize_perf("files", run.platform, files, &mut store)?
            };
            emit(&summary, args.format)?;
        }
        Command::Colors { run, files } => {
            let mut store = AggregationStore::new();
            let summary = if files.is_empty() {
                orchestrator.color_run(&run.parameters(DataKind::Colors), &mut store)?
            } else {
                orchestrator.summarize_colors("files", files, &mut store)?
            };
            emit(&summary, args.format)?;
        }
        Command::Boxplot { run, quantity, .. } => {
            let params = run.parameters(DataKind::Perf);
            match orchestrator.box_plot_sweep(&params, (*quantity).into()) {
                Ok(sweep) => emit(&sweep, args.format)?,
                Err(err) => {
                    if !err.completed.levels.is_empty() {
                        emit(&err.completed, args.format)?;
                    }
                    return Err(err.into());
                }
            }
        }
        Command::Bins { run, index, file } => {
            let snapshot = match (index, file) {
                (_, Some(path)) => orchestrator.snapshot_file(run.platform, path)?,
                (Some(index), None) => {
                    orchestrator.bins_snapshot(&run.parameters(DataKind::Colors), *index)?
                }
                (None, None) => anyhow::bail!("bins needs --index N or --file PATH"),
            };
            emit(&snapshot, args.format)?;
        }
        Command::Areas {
            map,
            pages,
            boundary,
        } => {
            let out_path = orchestrator.write_area_report(map, pages, (*boundary).into())?;
            println!("{}", out_path.display());
        }
    }

    Ok(())
}
