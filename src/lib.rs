//! # iplists - IP/CIDR list curation
//!
//! Tools for maintaining plaintext threat-intelligence lists: one IPv4/IPv6
//! address or CIDR block per line.
//!
//! ## Features
//!
//! - **Clean** - Keep only well-formed, publicly routable entries
//! - **Aggregate** - Coalesce a list into the minimal set of CIDR blocks
//! - **Prune** - Drop entries already covered by another list
//! - **AbuseIPDB** - Keep a dated local cache of the blacklist and build lists from it
//! - **Microsoft 365** - Extract one service area's ranges from the endpoints feed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        iplists                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: clean, aggregate, prune, adb, o365-ips     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Address-set engine (ipnet, synchronous)                    │
//! │    ├── validation: Validator + Normalizer                   │
//! │    ├── aggregator: Coalescer                                │
//! │    └── prune: ContainmentIndex + Differ                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Collaborators                                              │
//! │    ├── listfile: line reader / atomic line writer           │
//! │    ├── fetcher: AbuseIPDB + Microsoft 365 (reqwest)         │
//! │    └── cache + lock: dated JSON cache under flock           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use iplists::aggregator::aggregate_tokens;
//! use iplists::prune::{prune, ReferenceSet};
//!
//! let aggregation = aggregate_tokens(&["10.0.0.0/25", "10.0.0.128/25"]).unwrap();
//! assert_eq!(aggregation.lines, vec!["10.0.0.0/24"]);
//!
//! let reference = ReferenceSet::build(&["1.1.1.0/24"]);
//! let pruned = prune(&["1.1.1.1", "2.2.2.2"], &reference).unwrap();
//! assert_eq!(pruned.kept, vec!["2.2.2.2"]);
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - CIDR coalescing and rendering
//! - [`cache`] - AbuseIPDB blacklist cache
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Typed errors of the address-set engine
//! - [`fetcher`] - HTTP client for remote lists
//! - [`listfile`] - Line-oriented list files behind a mockable filesystem
//! - [`lock`] - File locking around cache updates
//! - [`prune`] - Containment index and list difference
//! - [`utils`] - Formatting helpers
//! - [`validation`] - Token validation and normalization

pub mod aggregator;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod listfile;
pub mod lock;
pub mod prune;
pub mod utils;
pub mod validation;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::ListError;
