//! iplists - curate plaintext IP/CIDR lists
//!
//! Cleans, aggregates and prunes threat-intelligence lists, and builds lists
//! from the AbuseIPDB blacklist and Microsoft 365 endpoint data.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use iplists::cli::{Cli, Commands};
use iplists::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load_or_default(cli.config.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Clean => iplists::commands::clean::run(),
        Commands::Aggregate { file, write, stats } => {
            iplists::commands::aggregate::run(&file, write, stats)
        }
        Commands::Prune {
            this_list,
            with_this_list,
        } => iplists::commands::prune::run(&this_list, &with_this_list),
        Commands::Adb { action } => iplists::commands::adb::run(action, &config).await,
        Commands::O365Ips {
            output,
            service,
            append,
        } => iplists::commands::o365::run(&output, service, append, &config).await,
        Commands::Version => {
            println!("iplists {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
