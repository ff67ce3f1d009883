//! Command implementations and argument parsing for the redcap CLI.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use redcap_core::{
    Contiguity, ControlConstraint, DataSource, DistanceMetric, Redcap, RedcapBuilder,
    RedcapError, Regionalization, Strategy, read_contiguity_edge_list,
};
use redcap_providers_dense::{
    DenseMatrixProvider, DenseMatrixProviderError, read_control_column_path,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

const DEFAULT_REGIONS: usize = 2;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "redcap",
    about = "Partition spatial observations into contiguous, homogeneous regions."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build a spanning tree and cut it into regions.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Number of regions to produce.
    #[arg(long, default_value_t = DEFAULT_REGIONS)]
    pub regions: usize,

    /// How the spanning tree is grown.
    #[arg(long, default_value_t = Strategy::FirstOrderSingle)]
    pub strategy: Strategy,

    /// Metric used to compare attribute rows.
    #[arg(long, default_value_t = DistanceMetric::Euclidean)]
    pub metric: DistanceMetric,

    /// Threads evaluating candidate cuts (defaults to available parallelism).
    #[arg(long)]
    pub workers: Option<NonZeroUsize>,

    /// Numeric column whose per-region total must exceed `--min-bound`.
    #[arg(long, requires = "min_bound")]
    pub control_column: Option<String>,

    /// Exclusive lower bound on each region's control total.
    #[arg(long, requires = "control_column", allow_negative_numbers = true)]
    pub min_bound: Option<f64>,

    /// Write the full spanning tree to this file as an edge list.
    #[arg(long)]
    pub export_tree: Option<PathBuf>,

    /// Data source configuration.
    #[command(subcommand)]
    pub source: RunSource,
}

/// Input data sources.
#[derive(Debug, Subcommand, Clone)]
pub enum RunSource {
    /// Read attributes from a Parquet `FixedSizeList<Float32 | Float64, D>` column.
    Parquet(ParquetArgs),
}

/// Parquet ingestion arguments.
#[derive(Debug, Args, Clone)]
pub struct ParquetArgs {
    /// Path to the Parquet file containing attribute vectors.
    pub path: PathBuf,

    /// Column containing the attribute rows.
    #[arg(long)]
    pub column: String,

    /// Edge-list file describing neighbouring observations.
    #[arg(long)]
    pub contiguity: PathBuf,

    /// Override name for the data source (defaults to the file name).
    #[arg(long)]
    pub name: Option<String>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while reading an input or writing an output.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Attribute or control ingestion failed.
    #[error(transparent)]
    Dense(#[from] DenseMatrixProviderError),
    /// Core regionalization failed.
    #[error(transparent)]
    Core(#[from] RedcapError),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Name reported by the data source implementation.
    pub data_source: String,
    /// Regions produced by the engine.
    pub result: Regionalization,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading inputs, running the engine or writing
/// the tree export fails.
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(
        regions = command.regions,
        strategy = %command.strategy,
        metric = %command.metric,
        source = field::Empty,
    ),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let RunCommand {
        regions,
        strategy,
        metric,
        workers,
        control_column,
        min_bound,
        export_tree,
        source,
    } = command;

    let builder = RedcapBuilder::new()
        .with_region_count(regions)
        .with_strategy(strategy)
        .with_metric(metric)
        .with_workers(workers);

    let summary = match source {
        RunSource::Parquet(args) => {
            Span::current().record("source", field::display("parquet"));
            let control = match (control_column, min_bound) {
                (Some(column), Some(bound)) => {
                    let values = read_control_column_path(&args.path, &column)?;
                    Some(ControlConstraint::new(values, bound)?)
                }
                _ => None,
            };
            let builder = match control {
                Some(control) => builder.with_control(control),
                None => builder,
            };
            run_parquet(&builder.build()?, args)?
        }
    };

    if let Some(path) = export_tree {
        write_tree(&summary.result, &path)?;
    }
    info!(
        data_source = summary.data_source.as_str(),
        regions = summary.result.region_count(),
        "command completed"
    );
    Ok(summary)
}

#[instrument(
    name = "cli.run_parquet",
    err,
    skip(redcap, args),
    fields(path = field::Empty, column = field::Empty, override_name = field::Empty),
)]
pub(super) fn run_parquet(
    redcap: &Redcap,
    args: ParquetArgs,
) -> Result<ExecutionSummary, CliError> {
    let ParquetArgs {
        path,
        column,
        contiguity,
        name,
    } = args;
    let span = Span::current();
    span.record("path", field::display(path.display()));
    span.record("column", field::display(&column));
    span.record(
        "override_name",
        field::display(name.as_deref().unwrap_or("<derived>")),
    );
    let chosen_name = derive_data_source_name(&path, name.as_deref());
    let provider = DenseMatrixProvider::try_from_parquet_path(chosen_name, &path, &column)?;
    if provider.invalid_count() > 0 {
        warn!(
            invalid = provider.invalid_count(),
            "observations with missing attributes are left unassigned"
        );
    }
    let contiguity = load_contiguity(&contiguity)?;
    let result = redcap.run(&provider, &contiguity)?;
    info!(
        data_source = provider.name(),
        regions = result.region_count(),
        "parquet execution completed"
    );
    Ok(ExecutionSummary {
        data_source: provider.name().to_owned(),
        result,
    })
}

#[instrument(name = "cli.load_contiguity", err, fields(path = field::Empty))]
pub(super) fn load_contiguity(path: &Path) -> Result<Contiguity, CliError> {
    Span::current().record("path", field::display(path.display()));
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(read_contiguity_edge_list(BufReader::new(file))?)
}

fn write_tree(result: &Regionalization, path: &Path) -> Result<(), CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    result.write_spanning_tree(&mut writer).map_err(io_error)?;
    writer.flush().map_err(io_error)
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "data_source".to_owned(), ToOwned::to_owned)
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// The header reports the strategy, region counts and SSD decomposition;
/// one `<observation>\t<region>` line follows per observation, with `-` for
/// observations that were not assigned.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let result = &summary.result;
    let quality = result.quality();
    writeln!(writer, "data source: {}", summary.data_source)?;
    writeln!(writer, "strategy: {}", result.strategy())?;
    writeln!(
        writer,
        "regions: {} (requested {})",
        result.region_count(),
        result.requested_regions()
    )?;
    writeln!(writer, "total ssd: {:.6}", quality.total_ssd())?;
    writeln!(writer, "within ssd: {:.6}", quality.within_ssd())?;
    writeln!(writer, "between ssd: {:.6}", quality.between_ssd())?;
    writeln!(writer, "between/total: {:.6}", quality.ratio())?;
    for (index, label) in result.labels().iter().enumerate() {
        match label {
            Some(region) => writeln!(writer, "{index}\t{}", region.get())?,
            None => writeln!(writer, "{index}\t-")?,
        }
    }
    Ok(())
}
