//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iplists")]
#[command(author, version, about = "Curate plaintext IP/CIDR lists")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read IPs and CIDRs from stdin and print the public, well-formed ones
    Clean,

    /// Merge a list into the minimal set of CIDR blocks
    Aggregate {
        /// List file to aggregate
        file: PathBuf,

        /// Overwrite the file with the aggregated list
        #[arg(short, long)]
        write: bool,

        /// Print only the summary line
        #[arg(short, long)]
        stats: bool,
    },

    /// Remove entries of one list that are covered by another
    Prune {
        /// List to prune in place
        this_list: PathBuf,

        /// Reference list
        with_this_list: PathBuf,
    },

    /// Manage the AbuseIPDB blacklist cache
    Adb {
        #[command(subcommand)]
        action: AdbAction,
    },

    /// Write Microsoft 365 endpoint ranges of one service area
    O365Ips {
        /// Output list file
        output: PathBuf,

        /// Service area display name (default from config)
        #[arg(long)]
        service: Option<String>,

        /// Append to the output instead of overwriting it
        #[arg(long)]
        append: bool,
    },

    /// Show version
    Version,
}

/// AbuseIPDB cache actions
#[derive(Subcommand)]
pub enum AdbAction {
    /// Download the blacklist and merge it into the cache
    Fetch {
        /// Cache file (JSON)
        cache: PathBuf,

        /// Drop cached IPs not seen for this many days
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Write cached IPs seen recently to a list
    Build {
        /// Cache file (JSON)
        cache: PathBuf,

        /// Output list file
        output: PathBuf,

        /// Include IPs seen within this many days (0 = all)
        #[arg(short, long)]
        days: Option<u32>,
    },
}
