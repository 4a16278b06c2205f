//! AbuseIPDB cache command implementation.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rand::seq::SliceRandom;
use std::path::Path;
use tracing::info;

use crate::cache::{Cache, MergeStats};
use crate::cli::AdbAction;
use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::listfile::{real_fs, write_lines, FileSystem, WriteMode};
use crate::lock::LockGuard;
use crate::utils::format_count_with_separator;

/// Counts from one cache update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheUpdate {
    pub merged: MergeStats,
    pub expired: usize,
    pub total: usize,
}

/// Current day in UTC, the date stamped on cache entries
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Run an adb subcommand
pub async fn run(action: AdbAction, config: &Config) -> Result<()> {
    let today = today();

    match action {
        AdbAction::Fetch { cache, days } => {
            let days = days.unwrap_or(config.adb.fetch_days);
            fetch(config, &cache, days, today).await
        }
        AdbAction::Build {
            cache,
            output,
            days,
        } => {
            let days = days.unwrap_or(config.adb.build_days);
            build(&cache, &output, days, today)
        }
    }
}

async fn fetch(config: &Config, cache_path: &Path, days: u32, today: NaiveDate) -> Result<()> {
    let keys = config.adb.keys()?;
    let key = keys
        .choose(&mut rand::thread_rng())
        .context("No AbuseIPDB API key available")?;

    let fetcher = Fetcher::new(&config.http)?;
    let fetched = fetcher.fetch_adb_blacklist(&config.adb, key).await?;

    let _lock = LockGuard::acquire(cache_path)?;
    let update = update_cache(real_fs(), cache_path, &fetched.ips, days, today)?;

    println!(
        "[AbuseIPDB] Updated cache with {} new IPs, removed {} expired IPs, total {} IPs active in the last {} days.",
        format_count_with_separator(update.merged.added as u128),
        format_count_with_separator(update.expired as u128),
        format_count_with_separator(update.total as u128),
        days
    );
    Ok(())
}

fn build(cache_path: &Path, output: &Path, days: u32, today: NaiveDate) -> Result<()> {
    let written = build_list(real_fs(), cache_path, output, days, today)?;

    if written == 0 {
        println!("No valid entries found in the local cache.");
    } else if days == 0 {
        println!(
            "Wrote {} entries to {}",
            format_count_with_separator(written as u128),
            output.display()
        );
    } else {
        println!(
            "Wrote {} ips active in the last {} days to {}",
            format_count_with_separator(written as u128),
            days,
            output.display()
        );
    }
    Ok(())
}

/// Merge freshly downloaded IPs into the cache file and expire stale entries
pub fn update_cache<F: FileSystem + ?Sized, S: AsRef<str>>(
    fs: &F,
    cache_path: &Path,
    ips: &[S],
    days: u32,
    today: NaiveDate,
) -> Result<CacheUpdate> {
    let mut cache = Cache::load(fs, cache_path)?;

    let merged = cache.merge(ips, today);
    let expired = cache.expire(days, today);
    cache.save(fs, cache_path)?;

    info!(
        "Cache {:?}: {} added, {} refreshed, {} expired",
        cache_path, merged.added, merged.refreshed, expired
    );

    Ok(CacheUpdate {
        merged,
        expired,
        total: cache.len(),
    })
}

/// Write cached IPs seen within `days` days (0 = all) to `output`.
///
/// Returns the number of entries written; nothing is written when there are none.
pub fn build_list<F: FileSystem + ?Sized>(
    fs: &F,
    cache_path: &Path,
    output: &Path,
    days: u32,
    today: NaiveDate,
) -> Result<usize> {
    let cache = Cache::load(fs, cache_path)?;
    let lines: Vec<String> = cache
        .active(days, today)
        .into_iter()
        .map(|entry| entry.ip.clone())
        .collect();

    if lines.is_empty() {
        return Ok(0);
    }

    write_lines(fs, output, &lines, WriteMode::Overwrite)
        .with_context(|| format!("Failed to build list from {:?}", cache_path))?;
    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listfile::{MockFileSystem, RealFileSystem};
    use std::io;
    use tempfile::TempDir;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_today_is_utc() {
        let before = Utc::now().date_naive();
        let stamped = today();
        let after = Utc::now().date_naive();
        assert!(stamped == before || stamped == after);
    }

    #[test]
    fn test_update_cache_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("adb.json");

        let update = update_cache(
            &RealFileSystem,
            &cache_path,
            &["8.8.8.8", "1.1.1.1"],
            100,
            day("2026-03-01"),
        )
        .unwrap();

        assert_eq!(update.merged.added, 2);
        assert_eq!(update.expired, 0);
        assert_eq!(update.total, 2);
        assert!(cache_path.exists());
    }

    #[test]
    fn test_update_cache_expires_old_entries() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("adb.json");

        update_cache(&RealFileSystem, &cache_path, &["1.1.1.1"], 100, day("2026-01-01")).unwrap();
        let update =
            update_cache(&RealFileSystem, &cache_path, &["2.2.2.2"], 10, day("2026-02-01"))
                .unwrap();

        assert_eq!(update.merged.added, 1);
        assert_eq!(update.expired, 1);
        assert_eq!(update.total, 1);
    }

    #[test]
    fn test_build_list_window() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("adb.json");
        let output = temp_dir.path().join("adb.txt");

        update_cache(&RealFileSystem, &cache_path, &["9.9.9.9"], 100, day("2026-01-01")).unwrap();
        update_cache(&RealFileSystem, &cache_path, &["5.5.5.5"], 100, day("2026-01-30")).unwrap();

        let written =
            build_list(&RealFileSystem, &cache_path, &output, 5, day("2026-02-01")).unwrap();
        assert_eq!(written, 1);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "5.5.5.5\n");

        let written =
            build_list(&RealFileSystem, &cache_path, &output, 0, day("2026-02-01")).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "5.5.5.5\n9.9.9.9\n"
        );
    }

    #[test]
    fn test_build_list_empty_cache_writes_nothing() {
        let mut mock_fs = MockFileSystem::new();
        mock_fs
            .expect_read_to_string()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "no cache")));
        mock_fs.expect_write_atomic().never();

        let written = build_list(
            &mock_fs,
            Path::new("/data/adb.json"),
            Path::new("/data/adb.txt"),
            30,
            day("2026-01-01"),
        )
        .unwrap();
        assert_eq!(written, 0);
    }
}
