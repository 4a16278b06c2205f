//! Containment-aware difference between two address lists.
//!
//! Entries of a target list are removed when a reference list subsumes them,
//! either verbatim (same text) or numerically (a reference block contains the
//! target entry).
//!
//! # Bucketing
//!
//! Reference blocks are bucketed by the first two groups of their network
//! address: the top 16 bits for IPv4 (`a.b`), the top 32 bits for IPv6
//! (`xxxx:yyyy`). Keys are always derived from the numeric address, never from
//! the text, so `2001:db8::/32` and `2001:0db8::1` land in the same bucket.
//!
//! A plain two-group bucket cannot hold a block that is wider than the bucket
//! itself (IPv4 prefixes below `/16`, IPv6 prefixes below `/32`): such a block
//! spans many keys. Those blocks are kept in a separate list that every lookup
//! scans, so containment answers stay exact.

use ipnet::IpNet;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::error::ListError;
use crate::validation::host_block;

const V4_KEY_BITS: u8 = 16;
const V6_KEY_BITS: u8 = 32;

/// Coarse bucket key: the first two address groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    V4(u16),
    V6(u32),
}

impl BucketKey {
    /// Key of the block's network address.
    ///
    /// # Examples
    /// ```
    /// use iplists::prune::BucketKey;
    /// let key = BucketKey::of(&"1.1.1.0/24".parse().unwrap());
    /// assert_eq!(key, BucketKey::of(&"1.1.200.7/32".parse().unwrap()));
    /// ```
    pub fn of(block: &IpNet) -> Self {
        match block {
            IpNet::V4(net) => BucketKey::V4((u32::from(net.network()) >> 16) as u16),
            IpNet::V6(net) => BucketKey::V6((u128::from(net.network()) >> 96) as u32),
        }
    }
}

fn spans_buckets(block: &IpNet) -> bool {
    match block {
        IpNet::V4(net) => net.prefix_len() < V4_KEY_BITS,
        IpNet::V6(net) => net.prefix_len() < V6_KEY_BITS,
    }
}

/// Bucketed lookup over reference blocks.
#[derive(Debug, Default)]
pub struct ContainmentIndex {
    buckets: HashMap<BucketKey, Vec<IpNet>>,
    wide: Vec<IpNet>,
}

impl ContainmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: IpNet) {
        if spans_buckets(&block) {
            self.wide.push(block);
        } else {
            self.buckets.entry(BucketKey::of(&block)).or_default().push(block);
        }
    }

    /// Number of indexed blocks.
    pub fn len(&self) -> usize {
        self.wide.len() + self.buckets.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether any indexed block contains `block`.
    ///
    /// Every candidate in the query's bucket and the wide list is considered.
    pub fn contains(&self, block: &IpNet) -> bool {
        self.buckets
            .get(&BucketKey::of(block))
            .into_iter()
            .flatten()
            .chain(self.wide.iter())
            .any(|candidate| candidate.contains(block))
    }
}

/// A reference list prepared for pruning: verbatim entries plus a containment index.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    exact: HashSet<String>,
    index: ContainmentIndex,
    skipped: usize,
}

impl ReferenceSet {
    /// Build from reference entries.
    ///
    /// The reference list is best-effort: entries that do not parse are logged
    /// and left out of the index (their text still counts for exact matches).
    pub fn build<S: AsRef<str>>(reference: &[S]) -> Self {
        let mut set = Self::default();

        for entry in reference {
            let entry = entry.as_ref();
            if entry.is_empty() {
                continue;
            }
            set.exact.insert(entry.to_string());

            match host_block(entry) {
                Ok(block) => set.index.insert(block),
                Err(e) => {
                    warn!("Skipping reference entry: {}", e);
                    set.skipped += 1;
                }
            }
        }

        debug!(
            "Reference set: {} exact entries, {} indexed blocks, {} skipped",
            set.exact.len(),
            set.index.len(),
            set.skipped
        );
        set
    }

    /// Number of reference entries that could not be indexed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Check whether the reference subsumes a target entry.
    ///
    /// # Errors
    /// Returns [`ListError::MalformedInput`] if the entry is not an exact match
    /// and does not parse.
    pub fn subsumes(&self, entry: &str) -> Result<bool, ListError> {
        if self.exact.contains(entry) {
            return Ok(true);
        }
        let block = host_block(entry)?;
        Ok(self.index.contains(&block))
    }
}

/// Outcome of pruning a target list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pruned {
    /// Entries not subsumed by the reference, in original order.
    pub kept: Vec<String>,
    /// Number of entries dropped.
    pub removed: usize,
}

/// Remove every target entry subsumed by the reference set.
///
/// # Errors
/// A malformed target entry aborts the prune, since the target is the list being rewritten.
///
/// # Examples
/// ```
/// use iplists::prune::{prune, ReferenceSet};
/// let reference = ReferenceSet::build(&["1.1.1.0/24"]);
/// let pruned = prune(&["1.1.1.1", "2.2.2.2"], &reference).unwrap();
/// assert_eq!(pruned.kept, vec!["2.2.2.2"]);
/// assert_eq!(pruned.removed, 1);
/// ```
pub fn prune<S: AsRef<str>>(target: &[S], reference: &ReferenceSet) -> Result<Pruned, ListError> {
    let mut kept = Vec::with_capacity(target.len());

    for entry in target {
        let entry = entry.as_ref();
        if !reference.subsumes(entry)? {
            kept.push(entry.to_string());
        }
    }

    let removed = target.len() - kept.len();
    Ok(Pruned { kept, removed })
}
