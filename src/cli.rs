use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "safe-copycat")]
#[command(about = "Redeploy a Safe to the same address on another chain")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and classify a Safe's creation transaction without deploying
    #[command(name = "check")]
    Check {
        /// Safe address
        safe_address: String,
        /// Chain id the Safe was originally created on
        source_chain_id: u64,
        /// Override the public RPC endpoint for the source chain
        #[arg(long)]
        source_rpc: Option<String>,
    },
    /// Replay the Safe's creation transaction on another chain
    #[command(name = "copy-safe")]
    CopySafe {
        /// Safe address
        safe_address: String,
        /// Chain id the Safe was originally created on
        source_chain_id: u64,
        /// Chain id to deploy the copy on
        target_chain_id: u64,
        /// RPC node URL for the target chain
        node_url: String,
        /// Deployer private key (hex, with or without 0x)
        private_key: String,
        /// Override the public RPC endpoint for the source chain
        #[arg(long)]
        source_rpc: Option<String>,
    },
    /// Compare the Safe's creation-time configuration with its live one
    #[command(name = "config-diff")]
    ConfigDiff {
        /// Safe address
        safe_address: String,
        /// Chain id the Safe lives on
        source_chain_id: u64,
        /// Override the public RPC endpoint for the source chain
        #[arg(long)]
        source_rpc: Option<String>,
    },
    /// List the known chains
    #[command(name = "chains")]
    Chains,
}
