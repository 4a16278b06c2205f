//! CIDR coalescing for address lists.
//!
//! Blocks are merged per address family into the minimal set of CIDR blocks
//! covering exactly the same addresses. For example:
//! `[10.0.0.0/25, 10.0.0.128/25] -> [10.0.0.0/24]`.
//!
//! Each family is handled as integer ranges over a `u128` value space of width
//! 32 (IPv4) or 128 (IPv6). Ranges are inclusive so `::/0` never overflows.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::ListError;
use crate::validation::normalize;

const V4_WIDTH: u8 = 32;
const V6_WIDTH: u8 = 128;

/// Coalesced blocks, one numerically sorted list per address family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coalesced {
    pub ipv4: Vec<Ipv4Net>,
    pub ipv6: Vec<Ipv6Net>,
}

impl Coalesced {
    pub fn len(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    /// All blocks, IPv4 first.
    pub fn blocks(&self) -> Vec<IpNet> {
        self.ipv4
            .iter()
            .copied()
            .map(IpNet::V4)
            .chain(self.ipv6.iter().copied().map(IpNet::V6))
            .collect()
    }

    /// Render all blocks as list lines, IPv4 first.
    pub fn render(&self) -> Vec<String> {
        self.blocks().iter().map(render_block).collect()
    }
}

/// Result of aggregating a token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Number of tokens read.
    pub input_count: usize,
    /// Rendered output lines.
    pub lines: Vec<String>,
    /// Addresses covered by the output, saturating at `u128::MAX`.
    pub addresses: u128,
}

impl Aggregation {
    /// Whether the output differs in size from the input.
    ///
    /// Equal counts mean nothing could be merged, so the source need not be rewritten.
    pub fn changed(&self) -> bool {
        self.lines.len() != self.input_count
    }
}

/// Coalesce blocks into the minimal covering set per family.
///
/// The output blocks are disjoint, sorted by numeric address, and no two of
/// them can be merged into a shorter prefix. Coalescing the output again
/// returns it unchanged.
pub fn coalesce(blocks: &[IpNet]) -> Coalesced {
    let mut v4_ranges = Vec::new();
    let mut v6_ranges = Vec::new();

    for block in blocks {
        match block {
            IpNet::V4(net) => v4_ranges.push(to_range(
                u32::from(net.network()) as u128,
                net.prefix_len(),
                V4_WIDTH,
            )),
            IpNet::V6(net) => v6_ranges.push(to_range(
                u128::from(net.network()),
                net.prefix_len(),
                V6_WIDTH,
            )),
        }
    }

    let ipv4 = split_ranges(&merge_ranges(v4_ranges), V4_WIDTH)
        .into_iter()
        .filter_map(|(start, prefix)| Ipv4Net::new(Ipv4Addr::from(start as u32), prefix).ok())
        .collect();
    let ipv6 = split_ranges(&merge_ranges(v6_ranges), V6_WIDTH)
        .into_iter()
        .filter_map(|(start, prefix)| Ipv6Net::new(Ipv6Addr::from(start), prefix).ok())
        .collect();

    Coalesced { ipv4, ipv6 }
}

/// Normalize and coalesce a list of tokens.
///
/// # Errors
/// The first malformed token aborts the whole aggregation with
/// [`ListError::MalformedInput`].
pub fn aggregate_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Aggregation, ListError> {
    let blocks = tokens
        .iter()
        .map(|t| normalize(t.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let coalesced = coalesce(&blocks);
    Ok(Aggregation {
        input_count: tokens.len(),
        lines: coalesced.render(),
        addresses: count_addresses(&coalesced.blocks()),
    })
}

/// Render a block as a list line.
///
/// Single-address blocks (`/32`, `/128`) are written without a prefix suffix.
///
/// # Examples
/// ```
/// use iplists::aggregator::render_block;
/// assert_eq!(render_block(&"1.2.3.4/32".parse().unwrap()), "1.2.3.4");
/// assert_eq!(render_block(&"1.2.3.0/24".parse().unwrap()), "1.2.3.0/24");
/// ```
pub fn render_block(block: &IpNet) -> String {
    if block.prefix_len() == block.max_prefix_len() {
        block.addr().to_string()
    } else {
        block.to_string()
    }
}

/// Calculate the total number of individual addresses covered by a list of blocks.
///
/// Uses saturating arithmetic so `::/0` does not overflow.
pub fn count_addresses(blocks: &[IpNet]) -> u128 {
    blocks
        .iter()
        .map(|net| {
            let shift = net.max_prefix_len() - net.prefix_len();
            if shift >= 128 {
                u128::MAX
            } else {
                1u128 << shift
            }
        })
        .fold(0u128, |acc, count| acc.saturating_add(count))
}

/// Mask covering the low `bits` bits.
fn host_mask(bits: u32) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

/// Inclusive range `[first, last]` covered by a block.
fn to_range(network: u128, prefix: u8, width: u8) -> (u128, u128) {
    (network, network | host_mask(u32::from(width - prefix)))
}

/// Sort ranges and merge overlapping or contiguous ones.
fn merge_ranges(mut ranges: Vec<(u128, u128)>) -> Vec<(u128, u128)> {
    ranges.sort_unstable();

    let mut merged: Vec<(u128, u128)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        if let Some(last) = merged.last_mut() {
            if start <= last.1.saturating_add(1) {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}

/// Split merged ranges into the fewest aligned blocks, as (network, prefix length).
///
/// Greedy: at each boundary take the largest aligned block that still fits.
fn split_ranges(ranges: &[(u128, u128)], width: u8) -> Vec<(u128, u8)> {
    let width_bits = u32::from(width);
    let mut blocks = Vec::new();

    for &(first, end) in ranges {
        let mut start = first;
        loop {
            let align = if start == 0 {
                width_bits
            } else {
                start.trailing_zeros().min(width_bits)
            };
            let span = end - start;
            let mut bits = align;
            while host_mask(bits) > span {
                bits -= 1;
            }

            blocks.push((start, width - bits as u8));

            let last = start + host_mask(bits);
            if last >= end {
                break;
            }
            start = last + 1;
        }
    }
    blocks
}
