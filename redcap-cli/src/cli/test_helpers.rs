//! Small helpers shared across CLI tests.
//!
//! The CLI unit tests write Parquet observations and edge-list contiguity
//! files to a temporary directory and assert error handling behaviour.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{ArrayRef, FixedSizeListArray, Int64Array, RecordBatch, types::Float64Type};
use parquet::arrow::arrow_writer::ArrowWriter;
use tempfile::TempDir;

use super::commands::run_command;
use super::{CliError, ParquetArgs, RunCommand, RunSource};
use redcap_core::{DistanceMetric, Strategy};

pub(super) type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Two plateaus on a line: `{0, 1, 2}` and `{3, 4, 5}`.
pub(super) const PLATEAUS: [Option<f64>; 6] =
    [Some(1.0), Some(1.1), Some(1.2), Some(9.0), Some(9.1), Some(9.2)];

pub(super) const LINE: &str = "0 6 redcap id\n0 1 1\n1 2 1\n2 3 1\n3 4 1\n4 5 1\n";

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_text_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

/// Writes a `features` column of one-wide rows (`None` rows are null) and a
/// `population` column of ones.
pub(super) fn create_parquet_file(
    dir: &TempDir,
    name: &str,
    rows: &[Option<f64>],
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.path().join(name);
    let features = FixedSizeListArray::from_iter_primitive::<Float64Type, _, _>(
        rows.iter().map(|row| row.map(|value| vec![Some(value)])),
        1,
    );
    let population = Int64Array::from(vec![1_i64; rows.len()]);
    let batch = RecordBatch::try_from_iter([
        ("features", Arc::new(features) as ArrayRef),
        ("population", Arc::new(population) as ArrayRef),
    ])?;
    let file = File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(path)
}

/// A `run` command over `path` with default tuning and no control column.
pub(super) fn parquet_command(path: PathBuf, contiguity: PathBuf, regions: usize) -> RunCommand {
    RunCommand {
        regions,
        strategy: Strategy::FirstOrderSingle,
        metric: DistanceMetric::Euclidean,
        workers: None,
        control_column: None,
        min_bound: None,
        export_tree: None,
        source: RunSource::Parquet(ParquetArgs {
            path,
            column: "features".into(),
            contiguity,
            name: None,
        }),
    }
}

pub(super) fn run_command_expecting_error(cmd: RunCommand, panic_msg: &str) -> CliError {
    match run_command(cmd) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
