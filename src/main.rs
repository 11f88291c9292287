mod chains;
mod classifier;
mod cli;
mod commands;
mod contracts;
mod decoder;
mod error;
mod replayer;
mod sync;
mod tx_service;
mod verifier;

use clap::Parser;
use cli::{Cli, Commands};
use tokio::runtime::Runtime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Check {
                safe_address,
                source_chain_id,
                source_rpc,
            } => commands::check(&safe_address, source_chain_id, source_rpc).await,
            Commands::CopySafe {
                safe_address,
                source_chain_id,
                target_chain_id,
                node_url,
                private_key,
                source_rpc,
            } => {
                commands::copy_safe(
                    &safe_address,
                    source_chain_id,
                    target_chain_id,
                    &node_url,
                    &private_key,
                    source_rpc,
                )
                .await
            }
            Commands::ConfigDiff {
                safe_address,
                source_chain_id,
                source_rpc,
            } => commands::config_diff(&safe_address, source_chain_id, source_rpc).await,
            Commands::Chains => commands::chains(),
        }
    })
}
