use std::collections::HashMap;
use std::error::Error;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;

use crate::contracts::ProxyFactory;
use crate::tx_service::{self, CreationRecord};
use crate::verifier::Verdict;
use crate::{chains, classifier, decoder, replayer, sync, verifier};

/// One redeployment attempt. Owns the fetched record, the service-host map
/// and the transaction-input cache; all of it dies with the flow.
struct Flow {
    client: reqwest::Client,
    service_hosts: HashMap<u64, String>,
    tx_inputs: HashMap<(u64, B256), Bytes>,
    source_rpc: Option<String>,
}

impl Flow {
    async fn init(source_rpc: Option<String>) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::new();
        let service_hosts = tx_service::chain_configs(&client).await?;
        Ok(Flow {
            client,
            service_hosts,
            tx_inputs: HashMap::new(),
            source_rpc,
        })
    }

    async fn creation_record(
        &self,
        chain_id: u64,
        safe: Address,
    ) -> Result<CreationRecord, Box<dyn Error>> {
        let host = self.service_hosts.get(&chain_id).ok_or_else(|| {
            format!(
                "No Safe transaction service for {}",
                chains::display_name(chain_id)
            )
        })?;
        Ok(tx_service::creation_info(&self.client, host, safe).await?)
    }

    fn source_rpc(&self, chain_id: u64) -> Result<String, Box<dyn Error>> {
        match &self.source_rpc {
            Some(url) => Ok(url.clone()),
            None => Ok(chains::rpc_url(chain_id)?.to_string()),
        }
    }

    /// Fetch the raw input of a transaction over a read-only RPC, memoized
    /// per (chain, hash) for the lifetime of this flow.
    async fn tx_input(&mut self, chain_id: u64, tx_hash: B256) -> Result<Bytes, Box<dyn Error>> {
        if let Some(input) = self.tx_inputs.get(&(chain_id, tx_hash)) {
            return Ok(input.clone());
        }
        let rpc = self.source_rpc(chain_id)?;
        let provider = ProviderBuilder::new().on_builtin(&rpc).await?;
        let tx = provider
            .get_transaction_by_hash(tx_hash)
            .await?
            .ok_or("Creation transaction not found on the source chain")?;
        let input = transaction_input(&tx);
        self.tx_inputs.insert((chain_id, tx_hash), input.clone());
        Ok(input)
    }
}

/// The raw calldata of a fetched transaction, via the consensus-layer
/// accessor on the inner envelope.
fn transaction_input(tx: &alloy::rpc::types::eth::Transaction) -> Bytes {
    alloy::consensus::Transaction::input(&tx.inner).clone()
}

fn parse_safe_address(safe_address: &str) -> Result<Address, Box<dyn Error>> {
    safe_address
        .parse()
        .map_err(|_| format!("Invalid Safe address: {safe_address}").into())
}

fn parse_signer(private_key: &str) -> Result<PrivateKeySigner, Box<dyn Error>> {
    let hex_key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(hex_key)?;
    if bytes.len() != 32 {
        return Err("Private key must be 32 bytes".into());
    }
    let b256 = B256::from_slice(&bytes);
    Ok(PrivateKeySigner::from_bytes(&b256)?)
}

pub async fn check(
    safe_address: &str,
    source_chain_id: u64,
    source_rpc: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let safe = parse_safe_address(safe_address)?;
    let mut flow = Flow::init(source_rpc).await?;

    let record = flow.creation_record(source_chain_id, safe).await?;
    println!("Safe: {}", safe.to_checksum(None));
    println!("Created on: {} ({})", chains::display_name(source_chain_id), record.created);
    println!("Creator: {}", record.creator.to_checksum(None));

    let input = flow.tx_input(source_chain_id, record.transaction_hash).await?;
    let call = decoder::decode(&input)?;
    let classification = classifier::classify(&record, &call, source_chain_id);

    println!("Factory: {} ({})", record.factory_address.to_checksum(None), classification.version);
    println!("Method: {}", call.method_name());
    println!(
        "Reproducible: {}",
        if classification.reproducible { "✅ yes" } else { "❌ no" }
    );

    if classification.reproducible {
        println!("\nCandidate target chains:");
        for chain in chains::CHAINS {
            if chain.chain_id == source_chain_id {
                continue;
            }
            if classifier::factory_for_target(classification.version, chain.chain_id).is_some() {
                println!("  {} ({})", chain.display_name, chain.chain_id);
            }
        }
    }

    Ok(())
}

pub async fn copy_safe(
    safe_address: &str,
    source_chain_id: u64,
    target_chain_id: u64,
    node_url: &str,
    private_key: &str,
    source_rpc: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let safe = parse_safe_address(safe_address)?;
    if source_chain_id == target_chain_id {
        return Err("Source and target chain must differ".into());
    }

    let mut flow = Flow::init(source_rpc).await?;

    println!("Getting creation transaction...");
    let record = flow.creation_record(source_chain_id, safe).await?;
    println!("Created: {} by {}", record.created, record.creator.to_checksum(None));

    let input = flow.tx_input(source_chain_id, record.transaction_hash).await?;
    let call = decoder::decode(&input)?;
    let classification = classifier::classify(&record, &call, source_chain_id);
    println!(
        "Factory: {} ({}), method {}",
        record.factory_address.to_checksum(None),
        classification.version,
        call.method_name()
    );

    if !classification.reproducible {
        return Err(format!(
            "This Safe cannot be copied to the same address: {}",
            if classification.version == classifier::FactoryVersion::Unsupported {
                "unsupported factory address".to_string()
            } else {
                format!("{} derives the address from the factory nonce", call.method_name())
            }
        )
        .into());
    }

    let target_factory = classifier::factory_for_target(classification.version, target_chain_id)
        .ok_or_else(|| {
            format!(
                "The {} factory is not available on {}",
                classification.version,
                chains::display_name(target_chain_id)
            )
        })?;

    let signer = parse_signer(private_key)?;
    let from = signer.address();
    if from != record.creator {
        println!("⚠️  You're not the creator of that Safe ({})", record.creator.to_checksum(None));
    }

    let wallet = EthereumWallet::from(signer);
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .on_builtin(node_url)
        .await?;

    // Cross-check the CREATE2 derivation against the target factory before
    // prompting for anything.
    let factory_code = provider.get_code_at(target_factory).await?;
    if factory_code.is_empty() {
        return Err(format!(
            "Proxy factory {} has no code on {}",
            target_factory.to_checksum(None),
            chains::display_name(target_chain_id)
        )
        .into());
    }
    let creation_code = ProxyFactory::new(target_factory, &provider)
        .proxyCreationCode()
        .call()
        .await?
        ._0;
    if let Some(predicted) = verifier::predict_address(target_factory, &creation_code, &call) {
        if predicted != safe {
            return Err(format!(
                "Replaying would deploy to {} instead of {}, aborting",
                predicted.to_checksum(None),
                safe.to_checksum(None)
            )
            .into());
        }
        println!("Predicted address: {} ✅", predicted.to_checksum(None));
    }

    match verifier::verify(&provider, safe, &call).await? {
        Verdict::AlreadyDeployed => {
            println!(
                "✅ A contract already exists at {} on {}, nothing to do",
                safe.to_checksum(None),
                chains::display_name(target_chain_id)
            );
            if let Some(url) = chains::safe_app_url(target_chain_id, safe) {
                println!("🔗 {url}");
            }
            return Ok(());
        }
        Verdict::Ready => {}
    }

    println!(
        "📤 Replaying {} on {}...",
        call.method_name(),
        chains::display_name(target_chain_id)
    );
    let outcome =
        replayer::replay(&provider, target_chain_id, target_factory, &call, from, safe).await?;
    println!("Transaction sent: 0x{:x}", outcome.transaction_hash);
    if let Some(url) = chains::safe_app_url(target_chain_id, safe) {
        println!("🔗 {url}");
    }

    // Best-effort confirmation; the outcome above stands either way.
    match replayer::watch_proxy_creation(&provider, outcome.transaction_hash).await {
        Some(proxy) => println!("New Safe deployed at {}", proxy.to_checksum(None)),
        None => log::debug!("no ProxyCreation event observed before giving up"),
    }

    report_drift(&flow, source_chain_id, safe, &call).await;

    Ok(())
}

/// Compare the setup the new Safe was just deployed with against the source
/// Safe's live configuration. Informational only; never fails the command.
async fn report_drift(
    flow: &Flow,
    source_chain_id: u64,
    safe: Address,
    call: &decoder::DecodedCall,
) {
    let initial = match sync::decode_initial_setup(call.initializer()) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("could not decode initializer for drift report: {e}");
            return;
        }
    };
    let current = match source_config(flow, source_chain_id, safe).await {
        Ok(config) => config,
        Err(e) => {
            log::warn!("could not read live config for drift report: {e}");
            return;
        }
    };

    let changes = sync::diff(&initial, &current);
    if changes.is_empty() {
        println!("Owner configuration matches the original Safe.");
        return;
    }

    println!("\n⚠️  The original Safe's configuration has drifted since creation:");
    for owner in &changes.added {
        println!("  + owner {}", owner.to_checksum(None));
    }
    for owner in &changes.removed {
        println!("  - owner {}", owner.to_checksum(None));
    }
    if let Some((old, new)) = changes.threshold_change {
        println!("  threshold {old} → {new}");
    }
    println!("\nCalls to bring the new Safe in sync (execute in order):");
    print_sync_calls(&sync::build_sync_calls(safe, &initial, &current));
}

async fn source_config(
    flow: &Flow,
    source_chain_id: u64,
    safe: Address,
) -> Result<sync::SafeConfig, Box<dyn Error>> {
    let rpc = flow.source_rpc(source_chain_id)?;
    let provider = ProviderBuilder::new().on_builtin(&rpc).await?;
    sync::live_config(&provider, safe).await
}

fn print_sync_calls(calls: &[sync::SyncCall]) {
    for (i, call) in calls.iter().enumerate() {
        println!("  {}. {}", i + 1, call.description);
        println!("     to:   {}", call.to.to_checksum(None));
        println!("     data: 0x{}", hex::encode(&call.data));
    }
}

pub async fn config_diff(
    safe_address: &str,
    source_chain_id: u64,
    source_rpc: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let safe = parse_safe_address(safe_address)?;
    let mut flow = Flow::init(source_rpc).await?;

    let record = flow.creation_record(source_chain_id, safe).await?;
    let input = flow.tx_input(source_chain_id, record.transaction_hash).await?;
    let call = decoder::decode(&input)?;
    let initial = sync::decode_initial_setup(call.initializer())?;
    let current = source_config(&flow, source_chain_id, safe).await?;

    println!("Initial: {} owner(s), threshold {}", initial.owners.len(), initial.threshold);
    println!("Current: {} owner(s), threshold {}", current.owners.len(), current.threshold);

    let changes = sync::diff(&initial, &current);
    if changes.is_empty() {
        println!("No drift: the Safe still matches its creation-time configuration.");
        return Ok(());
    }

    for owner in &changes.added {
        println!("  + owner {}", owner.to_checksum(None));
    }
    for owner in &changes.removed {
        println!("  - owner {}", owner.to_checksum(None));
    }
    if let Some((old, new)) = changes.threshold_change {
        println!("  threshold {old} → {new}");
    }

    println!("\nCorrective calls for a freshly copied Safe (execute in order):");
    print_sync_calls(&sync::build_sync_calls(safe, &initial, &current));

    Ok(())
}

pub fn chains() -> Result<(), Box<dyn Error>> {
    println!("{:>12}  {:<16} {:<10} rpc", "chain id", "name", "short");
    for chain in chains::CHAINS {
        println!(
            "{:>12}  {:<16} {:<10} {}",
            chain.chain_id,
            chain.display_name,
            chain.short_name,
            chain.rpc_url.unwrap_or("-")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    #[test]
    fn transaction_input_reads_the_inner_envelope() {
        // a legacy transaction as served by eth_getTransactionByHash
        let json = r#"{
            "hash": "0x4f8d2ef0f0744bd01dd8c0f746172ccfb49ffb1000000000000000000000a0ab",
            "nonce": "0x5",
            "blockHash": "0x8e38b4dbf6b11fcc3b9dee84fb7986e29ca0a02cecd8977c161ff7333329681e",
            "blockNumber": "0xeb7a4b",
            "transactionIndex": "0x41",
            "from": "0x1111111111111111111111111111111111111111",
            "to": "0xa6b71e26c5e0845f74c812102ca7114b6a896ab2",
            "value": "0x0",
            "gasPrice": "0x3b9aca00",
            "gas": "0x47b760",
            "input": "0x1688f0b9000000000000000000000000d9db270c1b5e3bd161e8c8503c55ceabee709552",
            "v": "0x25",
            "r": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "s": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "type": "0x0",
            "chainId": "0x1"
        }"#;
        let tx: alloy::rpc::types::eth::Transaction = serde_json::from_str(json).unwrap();
        let input = transaction_input(&tx);
        assert_eq!(&input[..4], ProxyFactory::createProxyWithNonceCall::SELECTOR);
        assert_eq!(input.len(), 36);
    }

    #[test]
    fn parse_signer_accepts_both_prefixes() {
        let key = "1111111111111111111111111111111111111111111111111111111111111111";
        let bare = parse_signer(key).unwrap();
        let prefixed = parse_signer(&format!("0x{key}")).unwrap();
        assert_eq!(bare.address(), prefixed.address());
        assert!(parse_signer("0xdeadbeef").is_err());
    }

    #[test]
    fn parse_safe_address_rejects_garbage() {
        assert!(parse_safe_address("0x1234567890123456789012345678901234567890").is_ok());
        assert!(parse_safe_address("not-an-address").is_err());
    }
}
