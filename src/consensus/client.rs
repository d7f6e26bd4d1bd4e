use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::blockchain::Block;
use crate::error::ConsensusError;

/// Route every node serves its chain on; peers are queried through it.
pub const CHAIN_PATH: &str = "/api/v1/chain/";

/// A peer's answer to the chain route.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Fetches the chain a peer currently reports.
#[allow(async_fn_in_trait)]
pub trait PeerClient {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, ConsensusError>;
}

/// `reqwest` client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    http: Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Result<Self, ConsensusError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, ConsensusError> {
        let url = format!("{}{}", peer.trim_end_matches('/'), CHAIN_PATH);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ConsensusError::PeerStatus {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<ChainSnapshot>().await?)
    }
}
