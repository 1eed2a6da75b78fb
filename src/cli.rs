//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use catalog_fetch::config::DEFAULT_BASE_URL;
use catalog_fetch::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY, READ_TIMEOUT_SECS, default_workers,
};
use catalog_fetch::{ConfigError, Credentials, RunConfig, SiteConfig};

/// Sign in, scrape the catalog and download every item.
///
/// Files already present with the size the server declares are skipped;
/// files of the wrong size are downloaded again from scratch.
#[derive(Parser)]
#[command(name = "catalog-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// Account identifier (e-mail address) to sign in with
    #[arg(allow_hyphen_values = true)]
    pub account: String,

    /// Password for the account (may start with '-')
    #[arg(allow_hyphen_values = true)]
    pub credential: String,

    /// Number of parallel download workers (1-100) [default: available CPUs]
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: Option<u8>,

    /// Locations buffered between catalog and workers (1-1000)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY as u16, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub queue_capacity: u16,

    /// Directory to write files to
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Site to sign in to and download from
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout: u64,

    /// Limit for a whole request, body included, in seconds
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("account", &self.account)
            .field("credential", &"<redacted>")
            .field("workers", &self.workers)
            .field("queue_capacity", &self.queue_capacity)
            .field("output_dir", &self.output_dir)
            .field("base_url", &self.base_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish()
    }
}

impl Args {
    /// Builds the run configuration.
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        let site = SiteConfig::with_base_url(&self.base_url)?;
        let credentials = Credentials {
            account: self.account,
            credential: self.credential,
        };

        let mut config = RunConfig::new(site, credentials);
        config.workers = self.workers.map_or_else(default_workers, usize::from);
        config.queue_capacity = usize::from(self.queue_capacity);
        config.output_dir = self.output_dir;
        config.connect_timeout = Duration::from_secs(self.connect_timeout);
        config.request_timeout = Duration::from_secs(self.request_timeout);
        Ok(config)
    }
}
