use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::debug;
use url::Url;
use vigil_api_types::{
    block::{BlockSummary, SignedBlockView},
    committee::CommitteeData,
    duty::ProposerDutyData,
    header::HeadHeaderData,
    response::DataResponse,
};

use crate::{
    cache::{CacheConfig, CacheStats, SlotCache},
    errors::ClientError,
    http_client::ClientWithBaseUrl,
    single_flight::{Flight, SingleFlight, wait_settled},
};

/// Beacon REST client layered over the slot caches.
///
/// All outbound requests share one semaphore, so the concurrency ceiling
/// holds across committee pre-fetch and block fetch phases alike. Block and
/// committee fetches are single-flighted per slot.
pub struct BeaconApiClient {
    http: ClientWithBaseUrl,
    semaphore: Semaphore,
    block_cache: SlotCache<Option<BlockSummary>>,
    committee_cache: SlotCache<Vec<CommitteeData>>,
    block_flights: SingleFlight,
    committee_flights: SingleFlight,
    cleanup_interval: Duration,
}

impl BeaconApiClient {
    pub fn new(
        endpoint: Url,
        request_timeout: Duration,
        max_concurrent_requests: usize,
        cache_config: CacheConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: ClientWithBaseUrl::new(endpoint, request_timeout)?,
            semaphore: Semaphore::new(max_concurrent_requests),
            block_cache: SlotCache::new("block", cache_config),
            committee_cache: SlotCache::new("committee", cache_config),
            block_flights: SingleFlight::new(),
            committee_flights: SingleFlight::new(),
            cleanup_interval: cache_config.cleanup_interval,
        })
    }

    /// Current head slot via `GET /eth/v1/beacon/headers/head`. Never cached.
    pub async fn head_slot(&self) -> Result<u64, ClientError> {
        let response: DataResponse<HeadHeaderData> = self
            .get_json("eth/v1/beacon/headers/head")
            .await?
            .ok_or(ClientError::HeadNotFound)?;
        Ok(response.data.header.message.slot)
    }

    /// Block at `slot`, or `None` for a missed slot. Missed slots are cached
    /// as tombstones and never refetched.
    pub async fn block(&self, slot: u64) -> Result<Option<BlockSummary>, ClientError> {
        if let Some(cached) = self.block_cache.get(slot) {
            return Ok(cached);
        }

        match self.block_flights.begin(slot) {
            Flight::Leader(guard) => {
                let fetched = self.fetch_block(slot).await?;
                self.block_cache.insert(slot, fetched.clone());
                drop(guard);
                Ok(fetched)
            }
            Flight::Follower(receiver) => {
                wait_settled(receiver).await;
                self.block_cache
                    .get(slot)
                    .ok_or(ClientError::SharedFlightFailed { slot })
            }
        }
    }

    /// Ordered committees for `slot`, or `None` when the state is not
    /// available (404). Unlike missed blocks, a missing committee list is
    /// not cached, so a later batch may retry it.
    pub async fn committees(&self, slot: u64) -> Result<Option<Vec<CommitteeData>>, ClientError> {
        if let Some(cached) = self.committee_cache.get(slot) {
            return Ok(Some(cached));
        }

        match self.committee_flights.begin(slot) {
            Flight::Leader(guard) => {
                let path = format!("eth/v1/beacon/states/{slot}/committees?slot={slot}");
                let fetched: Option<DataResponse<Vec<CommitteeData>>> =
                    self.get_json(&path).await?;
                let committees = match fetched {
                    Some(response) => response.data,
                    None => return Ok(None),
                };
                self.committee_cache.insert(slot, committees.clone());
                drop(guard);
                Ok(Some(committees))
            }
            Flight::Follower(receiver) => {
                wait_settled(receiver).await;
                self.committee_cache
                    .get(slot)
                    .map(Some)
                    .ok_or(ClientError::SharedFlightFailed { slot })
            }
        }
    }

    /// Proposer duties for an epoch, or `None` when the epoch is unknown to
    /// the node (404).
    pub async fn proposer_duties(
        &self,
        epoch: u64,
    ) -> Result<Option<Vec<ProposerDutyData>>, ClientError> {
        let path = format!("eth/v1/validator/duties/proposer/{epoch}");
        let response: Option<DataResponse<Vec<ProposerDutyData>>> = self.get_json(&path).await?;
        Ok(response.map(|response| response.data))
    }

    async fn fetch_block(&self, slot: u64) -> Result<Option<BlockSummary>, ClientError> {
        let path = format!("eth/v2/beacon/blocks/{slot}");
        let response: Option<DataResponse<SignedBlockView>> = self.get_json(&path).await?;
        Ok(response.map(|response| BlockSummary::from(response.data.message)))
    }

    /// One GET under the concurrency cap. 404 maps to `None`; any other
    /// non-success status is an error.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ClientError::Shutdown)?;

        let request = self
            .http
            .get(path)
            .map_err(|err| ClientError::Url(err.to_string()))?;
        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<T>().await?)),
            status => Err(ClientError::UnexpectedStatus {
                status,
                path: path.to_string(),
            }),
        }
    }

    pub fn block_cache_stats(&self) -> CacheStats {
        self.block_cache.stats()
    }

    pub fn committee_cache_stats(&self) -> CacheStats {
        self.committee_cache.stats()
    }

    /// Spawn the periodic TTL sweep over both caches. The caller aborts the
    /// returned handle on shutdown.
    pub fn spawn_cache_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(client.cleanup_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately and sweeps an empty cache.
            interval.tick().await;
            loop {
                interval.tick().await;
                let blocks = client.block_cache.evict_expired();
                let committees = client.committee_cache.evict_expired();
                if blocks + committees > 0 {
                    debug!(blocks, committees, "Swept expired cache entries");
                }
            }
        })
    }
}
