//! Prune command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::commands::WriteOutcome;
use crate::error::ListError;
use crate::listfile::{read_lines, real_fs, write_lines, FileSystem, WriteMode};
use crate::prune::{prune, ReferenceSet};

/// Result of pruning one list file against another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub kept: usize,
    pub removed: usize,
    /// Reference entries that could not be parsed
    pub skipped_reference: usize,
    pub outcome: WriteOutcome,
}

/// Run the prune command
pub fn run(this_list: &Path, with_this_list: &Path) -> Result<()> {
    let report = prune_file(real_fs(), this_list, with_this_list)?;

    match report.outcome {
        WriteOutcome::Written => {
            println!("Pruned {} entries from {}", report.removed, this_list.display())
        }
        WriteOutcome::Unchanged => println!("No entries pruned from {}", this_list.display()),
    }
    Ok(())
}

/// Remove entries of `target` covered by `reference`, rewriting `target` in place.
///
/// The target file is left untouched when nothing was removed.
///
/// # Errors
/// Fails with [`ListError::EmptyInput`] if the target has no entries, and with
/// [`ListError::MalformedInput`] if a target entry does not parse. Malformed
/// reference entries are logged and skipped.
pub fn prune_file<F: FileSystem + ?Sized>(
    fs: &F,
    target: &Path,
    reference: &Path,
) -> Result<PruneReport> {
    let target_entries = read_lines(fs, target)?;
    if target_entries.is_empty() {
        return Err(ListError::EmptyInput(target.display().to_string()).into());
    }

    let reference_entries = read_lines(fs, reference)?;
    let reference_set = ReferenceSet::build(&reference_entries);
    if reference_set.skipped() > 0 {
        warn!(
            "Skipped {} unparseable entries in {:?}",
            reference_set.skipped(),
            reference
        );
    }

    let pruned = prune(&target_entries, &reference_set)
        .with_context(|| format!("Failed to prune {:?}", target))?;
    info!(
        "{} of {} entries covered by {:?}",
        pruned.removed,
        target_entries.len(),
        reference
    );

    let outcome = if pruned.removed == 0 {
        WriteOutcome::Unchanged
    } else {
        write_lines(fs, target, &pruned.kept, WriteMode::Overwrite)?;
        WriteOutcome::Written
    };

    Ok(PruneReport {
        kept: pruned.kept.len(),
        removed: pruned.removed,
        skipped_reference: reference_set.skipped(),
        outcome,
    })
}
