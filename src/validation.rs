//! Token validation and normalization.
//!
//! This module holds the two leaf stages of the address-set engine:
//! - [`is_usable`] decides whether a token is a public, syntactically valid address or CIDR
//! - [`normalize`] turns a token into a canonical [`IpNet`] block
//!
//! # Excluded ranges
//!
//! A token is rejected when its address component falls inside one of these ranges:
//!
//! | Family | Range            | Meaning                     |
//! |--------|------------------|-----------------------------|
//! | IPv4   | `0.0.0.0/8`      | "this network"              |
//! | IPv4   | `10.0.0.0/8`     | RFC 1918 private            |
//! | IPv4   | `127.0.0.0/8`    | loopback                    |
//! | IPv4   | `169.254.0.0/16` | link-local                  |
//! | IPv4   | `172.16.0.0/12`  | RFC 1918 private            |
//! | IPv4   | `192.168.0.0/16` | RFC 1918 private            |
//! | IPv6   | `::/128`         | unspecified                 |
//! | IPv6   | `::1/128`        | loopback                    |
//! | IPv6   | `fc00::/7`       | unique local (IPv6 private) |
//! | IPv6   | `fe80::/10`      | link-local                  |
//!
//! IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are judged by the embedded IPv4 address.
//!
//! # IPv6 granularity
//!
//! A bare IPv6 address normalizes to its enclosing `/64`, not to a `/128` host block.
//! Aggregated IPv6 output is therefore expressed in subnets. This is a fixed policy
//! (see [`IPV6_HOST_PREFIX`]).

use ipnet::{IpNet, Ipv4Net};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::ListError;

/// Prefix length assigned to a bare IPv6 address by [`normalize`].
pub const IPV6_HOST_PREFIX: u8 = 64;

/// Excluded IPv4 ranges as (network, prefix length, description).
pub const EXCLUDED_V4: &[(u32, u8, &str)] = &[
    (0x0000_0000, 8, "this network (0.0.0.0/8)"),
    (0x0A00_0000, 8, "private (10.0.0.0/8)"),
    (0x7F00_0000, 8, "loopback (127.0.0.0/8)"),
    (0xA9FE_0000, 16, "link-local (169.254.0.0/16)"),
    (0xAC10_0000, 12, "private (172.16.0.0/12)"),
    (0xC0A8_0000, 16, "private (192.168.0.0/16)"),
];

/// Excluded IPv6 ranges as (network, prefix length, description).
pub const EXCLUDED_V6: &[(u128, u8, &str)] = &[
    (0, 128, "unspecified (::/128)"),
    (1, 128, "loopback (::1/128)"),
    (0xfc00 << 112, 7, "unique local (fc00::/7)"),
    (0xfe80 << 112, 10, "link-local (fe80::/10)"),
];

/// Why a token was not usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The token does not parse as an address or CIDR.
    Malformed(ListError),
    /// The address lies in an excluded range.
    Excluded(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed(e) => write!(f, "{}", e),
            Rejection::Excluded(range) => write!(f, "excluded range {}", range),
        }
    }
}

/// Check whether a token is a usable (valid, public) address or CIDR.
///
/// # Examples
/// ```
/// use iplists::validation::is_usable;
/// assert!(is_usable("8.8.8.8"));
/// assert!(is_usable("1.1.1.0/24"));
/// assert!(!is_usable("10.1.2.3"));
/// assert!(!is_usable("127.0.0.1"));
/// assert!(!is_usable("not-an-ip"));
/// ```
pub fn is_usable(token: &str) -> bool {
    rejection_reason(token).is_none()
}

/// Explain why a token would be rejected, or `None` if it is usable.
pub fn rejection_reason(token: &str) -> Option<Rejection> {
    let (addr, prefix) = match split_token(token) {
        Ok(parts) => parts,
        Err(e) => return Some(Rejection::Malformed(e)),
    };
    if let Some(prefix) = prefix {
        if let Err(e) = build_block(token, addr, prefix) {
            return Some(Rejection::Malformed(e));
        }
    }
    excluded_range(addr).map(Rejection::Excluded)
}

/// Return the description of the excluded range containing `addr`, if any.
pub fn excluded_range(addr: IpAddr) -> Option<&'static str> {
    match addr {
        IpAddr::V4(v4) => excluded_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => excluded_v4(v4),
            None => excluded_v6(v6),
        },
    }
}

fn excluded_v4(addr: Ipv4Addr) -> Option<&'static str> {
    let value = u32::from(addr);
    EXCLUDED_V4
        .iter()
        .find(|(network, prefix, _)| {
            let mask = if *prefix == 0 {
                0
            } else {
                u32::MAX << (32 - prefix)
            };
            value & mask == *network
        })
        .map(|(_, _, name)| *name)
}

fn excluded_v6(addr: Ipv6Addr) -> Option<&'static str> {
    let value = u128::from(addr);
    EXCLUDED_V6
        .iter()
        .find(|(network, prefix, _)| {
            let mask = if *prefix == 0 {
                0
            } else {
                u128::MAX << (128 - prefix)
            };
            value & mask == *network
        })
        .map(|(_, _, name)| *name)
}

/// Normalize a token into a canonical block.
///
/// Bare IPv4 addresses become `/32`, bare IPv6 addresses become their `/64`.
/// CIDR tokens keep their prefix and have the host bits cleared.
///
/// # Errors
/// Returns [`ListError::MalformedInput`] if the token is neither a valid address
/// nor a valid CIDR, or if the prefix length is out of range for the family.
///
/// # Examples
/// ```
/// use iplists::validation::normalize;
/// assert_eq!(normalize("1.2.3.4").unwrap().to_string(), "1.2.3.4/32");
/// assert_eq!(normalize("1.2.3.4/24").unwrap().to_string(), "1.2.3.0/24");
/// assert_eq!(normalize("2001:db8::1").unwrap().to_string(), "2001:db8::/64");
/// assert!(normalize("1.2.3.4/33").is_err());
/// ```
pub fn normalize(token: &str) -> Result<IpNet, ListError> {
    let (addr, prefix) = split_token(token)?;
    let prefix = prefix.unwrap_or(match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => IPV6_HOST_PREFIX,
    });
    build_block(token, addr, prefix)
}

/// Parse a token at host granularity: bare addresses become `/32` or `/128`.
///
/// Used where exact membership matters more than aggregation policy.
/// IPv4-mapped IPv6 blocks are returned as their IPv4 equivalent, matching how
/// [`excluded_range`] judges them.
pub fn host_block(token: &str) -> Result<IpNet, ListError> {
    let (addr, prefix) = split_token(token)?;
    let block = match prefix {
        Some(prefix) => build_block(token, addr, prefix)?,
        None => IpNet::from(addr),
    };
    Ok(unmap_v4(block))
}

/// `::ffff:a.b.c.d/n` with `n >= 96` as `a.b.c.d/(n - 96)`.
fn unmap_v4(block: IpNet) -> IpNet {
    match block {
        IpNet::V6(net) if net.prefix_len() >= 96 => match net.network().to_ipv4_mapped() {
            Some(v4) => Ipv4Net::new(v4, net.prefix_len() - 96)
                .map(IpNet::V4)
                .unwrap_or(block),
            None => block,
        },
        _ => block,
    }
}

/// Split a token into its address and optional prefix length.
fn split_token(token: &str) -> Result<(IpAddr, Option<u8>), ListError> {
    match token.split_once('/') {
        Some((addr, prefix)) => {
            let addr: IpAddr = addr
                .parse()
                .map_err(|_| ListError::malformed(token, "address does not parse"))?;
            if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ListError::malformed(token, "prefix length is not a number"));
            }
            let prefix: u8 = prefix
                .parse()
                .map_err(|_| ListError::malformed(token, "prefix length out of range"))?;
            Ok((addr, Some(prefix)))
        }
        None => {
            let addr: IpAddr = token
                .parse()
                .map_err(|_| ListError::malformed(token, "not an IP address"))?;
            Ok((addr, None))
        }
    }
}

fn build_block(token: &str, addr: IpAddr, prefix: u8) -> Result<IpNet, ListError> {
    IpNet::new(addr, prefix)
        .map(|net| net.trunc())
        .map_err(|_| {
            let max = match addr {
                IpAddr::V4(_) => 32,
                IpAddr::V6(_) => 128,
            };
            ListError::malformed(
                token,
                format!("prefix length {} out of range (0-{})", prefix, max),
            )
        })
}
