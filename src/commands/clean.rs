//! Clean command implementation.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::debug;

use crate::validation::rejection_reason;

/// Run the clean command: filter stdin to stdout
pub fn run() -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let kept = clean(stdin.lock(), &mut out)?;
    out.flush().context("Failed to flush standard output")?;

    debug!("Kept {} entries", kept);
    Ok(())
}

/// Copy usable tokens from `input` to `output`, one per line.
///
/// Blank lines and `#` comments are skipped silently; every other rejected
/// line is logged at debug level with its reason. Returns the number of lines kept.
pub fn clean<R: BufRead, W: Write>(input: R, output: &mut W) -> Result<usize> {
    let mut kept = 0;

    for line in input.lines() {
        let line = line.context("Failed to read standard input")?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }

        match rejection_reason(token) {
            None => {
                writeln!(output, "{}", token).context("Failed to write output")?;
                kept += 1;
            }
            Some(reason) => debug!("Rejected '{}': {}", token, reason),
        }
    }

    Ok(kept)
}
