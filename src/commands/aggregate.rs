//! Aggregate command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::aggregator::{aggregate_tokens, Aggregation};
use crate::commands::WriteOutcome;
use crate::error::ListError;
use crate::listfile::{read_lines, real_fs, write_lines, FileSystem, WriteMode};
use crate::utils::format_count_with_separator;

/// Where the aggregated list goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Print the list to stdout
    Print,
    /// Overwrite the source file
    Write,
    /// Print only the summary
    StatsOnly,
}

impl OutputMode {
    /// `--stats` wins over `--write`
    pub fn from_flags(write: bool, stats: bool) -> Self {
        match (write, stats) {
            (_, true) => OutputMode::StatsOnly,
            (true, false) => OutputMode::Write,
            (false, false) => OutputMode::Print,
        }
    }
}

/// Run the aggregate command
pub fn run(file: &Path, write: bool, stats: bool) -> Result<()> {
    let fs = real_fs();
    let mode = OutputMode::from_flags(write, stats);

    let aggregation = aggregate_file(fs, file)?;

    if mode == OutputMode::Print {
        for line in &aggregation.lines {
            println!("{}", line);
        }
        return Ok(());
    }

    let outcome = match mode {
        OutputMode::Write => rewrite(fs, file, &aggregation)?,
        _ => WriteOutcome::Unchanged,
    };
    debug!("Aggregate outcome for {:?}: {:?}", file, outcome);

    println!("{}", summary(&aggregation, file));
    Ok(())
}

/// Read and aggregate a list file.
///
/// # Errors
/// Fails with [`ListError::EmptyInput`] when the file has no entries, and with
/// [`ListError::MalformedInput`] on the first token that does not parse.
pub fn aggregate_file<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Aggregation> {
    let tokens = read_lines(fs, path)?;
    if tokens.is_empty() {
        return Err(ListError::EmptyInput(path.display().to_string()).into());
    }

    let aggregation =
        aggregate_tokens(&tokens).with_context(|| format!("Failed to aggregate {:?}", path))?;

    info!(
        "Aggregated {} entries into {} blocks",
        aggregation.input_count,
        aggregation.lines.len()
    );
    Ok(aggregation)
}

/// Overwrite `path` with the aggregated list unless nothing was merged
pub fn rewrite<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    aggregation: &Aggregation,
) -> Result<WriteOutcome> {
    if !aggregation.changed() {
        return Ok(WriteOutcome::Unchanged);
    }
    write_lines(fs, path, &aggregation.lines, WriteMode::Overwrite)?;
    Ok(WriteOutcome::Written)
}

/// Human summary line for the stats and write modes
pub fn summary(aggregation: &Aggregation, path: &Path) -> String {
    if !aggregation.changed() {
        return "No aggregation needed, input and output are the same.".to_string();
    }
    format!(
        "Aggregated {} from {} IPs & CIDRs in {} ({} addresses)",
        format_count_with_separator(aggregation.lines.len() as u128),
        format_count_with_separator(aggregation.input_count as u128),
        path.display(),
        format_count_with_separator(aggregation.addresses)
    )
}
