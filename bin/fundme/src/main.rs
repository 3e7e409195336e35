//! fundme is a CLI tool to deploy the FundMe contract and its price feed.

mod cli;

use std::path::Path;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use cli::{Cli, Command};
use fundme_deploy::{
    CONFIG_FILENAME, DeployerBuilder, DeploymentStore, ProjectConfig,
    report::{deployments_table, networks_table},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load `.env` before clap reads its env fallbacks.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match cli.command {
        Command::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "fundme",
                &mut std::io::stdout(),
            );
        }
        Command::Init { force } => {
            let path = cli
                .config
                .unwrap_or_else(|| Path::new(CONFIG_FILENAME).to_path_buf());
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            ProjectConfig::default().save_to_file(&path)?;
        }
        Command::Networks => {
            let config = ProjectConfig::load(cli.config.as_deref())?;
            println!("{}", networks_table(&config));
        }
        Command::Deployments { network } => {
            let config = ProjectConfig::load(cli.config.as_deref())?;
            let network = network.unwrap_or_else(|| config.default_network.clone());
            let records = DeploymentStore::read_only(&config.paths.deployments, &network).list()?;

            if records.is_empty() {
                tracing::info!(network = %network, "No deployments recorded");
            } else {
                println!("{}", deployments_table(&records));
            }
        }
        Command::Deploy {
            network,
            tags,
            reset,
        } => {
            let config = ProjectConfig::load(cli.config.as_deref())?;
            let mut builder = DeployerBuilder::new(config);
            if let Some(network) = network {
                builder = builder.network(network);
            }

            let deployer = builder.build().await?;
            deployer.deploy(&tags, reset).await?;
        }
        Command::Verify { contract, network } => {
            let config = ProjectConfig::load(cli.config.as_deref())?;
            let mut builder = DeployerBuilder::new(config);
            if let Some(network) = network {
                builder = builder.network(network);
            }

            let deployer = builder.build().await?;
            deployer.verify_contract(&contract).await?;
        }
    }

    Ok(())
}
