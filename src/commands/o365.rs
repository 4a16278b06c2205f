//! Microsoft 365 ranges command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::warn;

use crate::config::Config;
use crate::fetcher::{Fetcher, ServiceArea};
use crate::listfile::{real_fs, write_lines, FileSystem, WriteMode};

/// Run the o365-ips command
pub async fn run(
    output: &Path,
    service: Option<String>,
    append: bool,
    config: &Config,
) -> Result<()> {
    let service = service.unwrap_or_else(|| config.o365.service.clone());
    let mode = if append {
        WriteMode::Append
    } else {
        WriteMode::Overwrite
    };

    let fetcher = Fetcher::new(&config.http)?;
    let areas = fetcher.fetch_o365(&config.o365).await?;

    let written = write_service(real_fs(), &areas, &service, output, mode)?;
    if written == 0 {
        warn!("No ranges found for service area '{}'", service);
    } else {
        println!("Wrote {} {} ranges to {}", written, service, output.display());
    }
    Ok(())
}

/// Write the ranges of one service area to `output`.
///
/// Returns how many ranges were written; the file is not touched when the
/// service has none.
pub fn write_service<F: FileSystem + ?Sized>(
    fs: &F,
    areas: &[ServiceArea],
    service: &str,
    output: &Path,
    mode: WriteMode,
) -> Result<usize> {
    let Some(area) = areas.iter().find(|area| area.name == service) else {
        return Ok(0);
    };
    if area.ips.is_empty() {
        return Ok(0);
    }

    write_lines(fs, output, &area.ips, mode)?;
    Ok(area.ips.len())
}
