use std::collections::HashMap;

use alloy::primitives::{Address, Bytes, B256};
use reqwest::Client;
use serde::Deserialize;

use crate::error::ServiceError;

const CONFIG_SERVICE: &str = "https://safe-config.safe.global/api/v1/chains/";

/// The historical creation record of a Safe, as served by the Safe
/// transaction service. Immutable once fetched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationRecord {
    pub created: String,
    pub creator: Address,
    pub factory_address: Address,
    #[serde(default)]
    pub master_copy: Option<Address>,
    #[serde(default)]
    pub setup_data: Option<Bytes>,
    pub transaction_hash: B256,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainPage {
    next: Option<String>,
    results: Vec<ChainEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainEntry {
    chain_id: String,
    transaction_service: String,
}

pub async fn creation_info(
    client: &Client,
    service_host: &str,
    safe: Address,
) -> Result<CreationRecord, ServiceError> {
    let url = format!(
        "{}/api/v1/safes/{}/creation/",
        service_host.trim_end_matches('/'),
        safe.to_checksum(None)
    );
    get_json(client, &url).await
}

/// Fetch the chain id → transaction-service host map from the Safe config
/// service, following pagination until exhausted.
pub async fn chain_configs(client: &Client) -> Result<HashMap<u64, String>, ServiceError> {
    let mut hosts = HashMap::new();
    let mut url = Some(CONFIG_SERVICE.to_string());
    while let Some(page_url) = url {
        let page: ChainPage = get_json(client, &page_url).await?;
        for entry in page.results {
            if let Ok(chain_id) = entry.chain_id.parse::<u64>() {
                hosts.insert(
                    chain_id,
                    entry.transaction_service.trim_end_matches('/').to_string(),
                );
            }
        }
        url = page.next;
    }
    Ok(hosts)
}

/// GET a JSON document. Transport failures get one transparent retry;
/// well-formed error responses never do.
async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, ServiceError> {
    let mut attempts = 0;
    let response = loop {
        attempts += 1;
        match client.get(url).send().await {
            Ok(response) => break response,
            Err(e) if attempts < 2 && (e.is_connect() || e.is_timeout()) => {
                log::debug!("retrying {url} after transport error: {e}");
            }
            Err(e) => return Err(ServiceError::Http(e)),
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}
