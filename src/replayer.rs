use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{keccak256, Address, B256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::TransactionRequest;
use alloy_sol_types::SolEvent;

use crate::contracts::ProxyFactory;
use crate::decoder::DecodedCall;
use crate::error::ReplayError;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const RECEIPT_POLL_ATTEMPTS: u32 = 40;

/// The result of a successful replay. Created only after the transaction is
/// accepted by the mempool; confirmation is a separate best-effort step.
#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub transaction_hash: B256,
    pub target_chain_id: u64,
    pub predicted_address: Address,
}

/// Replay the original creation call against the factory on the target
/// chain. The call data is re-encoded from the decoded parameters,
/// byte-identical to the original input; nothing is recomputed or
/// substituted.
pub async fn replay<P: Provider>(
    provider: &P,
    target_chain_id: u64,
    factory: Address,
    call: &DecodedCall,
    from: Address,
    predicted: Address,
) -> Result<DeploymentOutcome, ReplayError> {
    let actual = provider.get_chain_id().await.map_err(transport)?;
    if actual != target_chain_id {
        return Err(ReplayError::ChainMismatch {
            expected: target_chain_id,
            actual,
        });
    }

    let nonce = provider
        .get_transaction_count(from)
        .await
        .map_err(transport)?;

    let mut tx = TransactionRequest::default()
        .with_to(factory)
        .with_input(call.encode())
        .with_from(from)
        .with_nonce(nonce)
        .with_chain_id(target_chain_id)
        .with_gas_limit(1_000_000); // Safe creation needs more than a plain transfer

    if let Ok(fees) = provider.estimate_eip1559_fees(None).await {
        tx = tx
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas);
    }

    let pending = provider
        .send_transaction(tx)
        .await
        .map_err(classify_transport_error)?;
    let transaction_hash = *pending.tx_hash();
    log::debug!("replay transaction in mempool: 0x{transaction_hash:x}");

    Ok(DeploymentOutcome {
        transaction_hash,
        target_chain_id,
        predicted_address: predicted,
    })
}

/// Best-effort: poll for the receipt and pull the new proxy address out of
/// the ProxyCreation event. Silently gives up; never gates the outcome.
pub async fn watch_proxy_creation<P: Provider>(provider: &P, tx_hash: B256) -> Option<Address> {
    // v1.1.1 emits ProxyCreation(address), v1.3.0 ProxyCreation(address,address)
    let legacy_signature = keccak256(b"ProxyCreation(address)");

    for _ in 0..RECEIPT_POLL_ATTEMPTS {
        match provider.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => {
                let inner = receipt.inner.as_receipt()?;
                for log in &inner.logs {
                    let topics = log.topics();
                    let Some(&topic0) = topics.first() else {
                        continue;
                    };
                    if topic0 != ProxyFactory::ProxyCreation::SIGNATURE_HASH
                        && topic0 != legacy_signature
                    {
                        continue;
                    }
                    if topics.len() >= 2 {
                        return Some(Address::from_slice(&topics[1][12..]));
                    }
                    let data = &log.data().data;
                    if data.len() >= 32 {
                        return Some(Address::from_slice(&data[12..32]));
                    }
                }
                return None;
            }
            Ok(None) => {}
            Err(e) => log::debug!("receipt poll failed: {e}"),
        }
        tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
    }
    None
}

fn transport(e: alloy::transports::TransportError) -> ReplayError {
    ReplayError::Network(e.to_string())
}

fn classify_transport_error(e: alloy::transports::TransportError) -> ReplayError {
    if let Some(response) = e.as_error_resp() {
        return classify_rpc_failure(response.code, &response.message);
    }
    ReplayError::Network(e.to_string())
}

/// Sort a JSON-RPC error response into the replay taxonomy: a wallet/signer
/// refusal is not a bug, an on-chain revert is fatal for this attempt, and
/// everything else is transport.
fn classify_rpc_failure(code: i64, message: &str) -> ReplayError {
    let lower = message.to_lowercase();
    if code == 4001 || lower.contains("rejected") || lower.contains("denied") {
        ReplayError::UserRejected
    } else if lower.contains("revert") {
        log::debug!("replay reverted, full reason: {message}");
        ReplayError::Reverted {
            reason: message.to_string(),
        }
    } else {
        ReplayError::Network(message.to_string())
    }
}
