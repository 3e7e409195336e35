use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use fundme_deploy::Tag;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "fundme")]
#[command(
    author,
    version,
    about = "Deploy the FundMe contract and its price feed to local and live networks"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, global = true, env = "FUNDME_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the project configuration file.
    ///
    /// Defaults to ./fundme.toml. A missing file means built-in defaults.
    #[arg(long, alias = "conf", global = true, env = "FUNDME_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the deploy scripts against a network.
    Deploy {
        /// The network to deploy to. Defaults to `default_network` from the configuration.
        #[arg(short, long, env = "FUNDME_NETWORK")]
        network: Option<String>,

        /// Only run the scripts carrying one of these tags (and their dependencies).
        ///
        /// Known tags: all, mocks, fundmd.
        #[arg(short, long, value_delimiter = ',', env = "FUNDME_TAGS")]
        tags: Vec<Tag>,

        /// Delete the network's deployment records and deploy everything again.
        #[arg(long, env = "FUNDME_RESET", default_value_t = false)]
        reset: bool,
    },

    /// Verify a recorded deployment on the block explorer.
    Verify {
        /// Name of the deployed contract.
        #[arg(short, long, default_value = "FundMe")]
        contract: String,

        #[arg(short, long, env = "FUNDME_NETWORK")]
        network: Option<String>,
    },

    /// List the configured networks.
    Networks,

    /// List the deployments recorded for a network.
    Deployments {
        #[arg(short, long, env = "FUNDME_NETWORK")]
        network: Option<String>,
    },

    /// Write the default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Print a shell completion script.
    Completions {
        shell: Shell,
    },
}
