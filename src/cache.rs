//! Local cache of AbuseIPDB blacklist entries.
//!
//! The free AbuseIPDB blacklist only returns the most recent entries, so the
//! cache remembers every IP it has seen together with the first and last day
//! it was listed. Lists are then built from entries active within a day window.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::listfile::FileSystem;
use crate::validation::host_block;

/// A cached blacklist entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub ip: String,
    pub last_seen: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<NaiveDate>,
}

impl CacheEntry {
    /// Whole days between `last_seen` and `today`.
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        today.signed_duration_since(self.last_seen).num_days()
    }
}

/// Counts from merging a fresh download into the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub refreshed: usize,
}

/// The on-disk cache, a JSON array of entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Cache {
    entries: Vec<CacheEntry>,
}

impl Cache {
    /// Load the cache; a missing file is an empty cache.
    pub fn load<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Self> {
        let content = match fs.read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache at {:?}, starting empty", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read cache file: {:?}", path));
            }
        };
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache file: {:?}", path))
    }

    /// Save the cache atomically, entries sorted by numeric address.
    pub fn save<F: FileSystem + ?Sized>(&mut self, fs: &F, path: &Path) -> Result<()> {
        self.sort();
        let content = serde_json::to_string_pretty(self).context("Failed to serialize cache")?;
        fs.write_atomic(path, content.as_bytes())
            .with_context(|| format!("Failed to write cache file: {:?}", path))
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a fresh download: known IPs are refreshed, new IPs added.
    pub fn merge<S: AsRef<str>>(&mut self, ips: &[S], today: NaiveDate) -> MergeStats {
        let mut positions: HashMap<String, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.ip.clone(), i))
            .collect();
        let mut stats = MergeStats::default();

        for ip in ips {
            let ip = ip.as_ref();
            match positions.get(ip) {
                Some(&i) => {
                    self.entries[i].last_seen = today;
                    stats.refreshed += 1;
                }
                None => {
                    positions.insert(ip.to_string(), self.entries.len());
                    self.entries.push(CacheEntry {
                        ip: ip.to_string(),
                        last_seen: today,
                        first_seen: Some(today),
                    });
                    stats.added += 1;
                }
            }
        }
        stats
    }

    /// Drop entries not seen for more than `days` days. Returns how many were dropped.
    pub fn expire(&mut self, days: u32, today: NaiveDate) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.age_days(today) <= i64::from(days));
        before - self.entries.len()
    }

    /// Entries seen within the last `days` days, in numeric address order.
    ///
    /// `days == 0` returns every entry.
    pub fn active(&self, days: u32, today: NaiveDate) -> Vec<&CacheEntry> {
        let mut active: Vec<&CacheEntry> = self
            .entries
            .iter()
            .filter(|e| days == 0 || e.age_days(today) <= i64::from(days))
            .collect();
        active.sort_by_cached_key(|e| sort_key(e));
        active
    }

    fn sort(&mut self) {
        self.entries.sort_by_cached_key(sort_key);
    }
}

/// Numeric address order, unparseable entries last.
fn sort_key(entry: &CacheEntry) -> (bool, Option<IpNet>, String) {
    let block = host_block(&entry.ip).ok();
    (block.is_none(), block, entry.ip.clone())
}
