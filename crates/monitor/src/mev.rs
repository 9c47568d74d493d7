use std::time::Duration;

use anyhow::bail;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;
use vigil_beacon_client::http_client::ClientWithBaseUrl;

/// Fire-and-forget MEV reward enrichment against a relay-style data API.
/// Lookup failures are logged and never reach the monitor core.
#[derive(Clone)]
pub struct MevRewardClient {
    http: ClientWithBaseUrl,
}

#[derive(Debug, Deserialize)]
struct BidTrace {
    value: String,
}

impl MevRewardClient {
    pub fn new(endpoint: Url, request_timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: ClientWithBaseUrl::new(endpoint, request_timeout)?,
        })
    }

    /// Spawn an unsupervised lookup for a proposed block. The monitor does
    /// not await the result.
    pub fn spawn_lookup(&self, validator_index: u64, slot: u64, block_number: u64) {
        let http = self.http.clone();
        tokio::spawn(async move {
            match fetch_reward(&http, block_number).await {
                Ok(Some(value_wei)) => info!(
                    validator_index,
                    slot,
                    block_number,
                    value_wei = %value_wei,
                    "MEV reward delivered"
                ),
                Ok(None) => debug!(block_number, "No MEV reward recorded for block"),
                Err(err) => warn!(block_number, "MEV reward lookup failed: {err:?}"),
            }
        });
    }
}

async fn fetch_reward(http: &ClientWithBaseUrl, block_number: u64) -> anyhow::Result<Option<String>> {
    let path = format!("relay/v1/data/bidtraces/proposer_payload_delivered?block_number={block_number}");
    let response = http.get(path)?.send().await?;
    if !response.status().is_success() {
        bail!("unexpected status {}", response.status());
    }
    let traces = response.json::<Vec<BidTrace>>().await?;
    Ok(traces.into_iter().next().map(|trace| trace.value))
}
