use std::sync::Mutex;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, Ledger};
use crate::config::NodeConfig;
use crate::consensus::HttpPeerClient;
use crate::error::ConsensusError;
use crate::transaction::Transaction;

/// Shared node state. Chain, pending pool and peers sit behind one lock.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub peer_client: HttpPeerClient,
    pub node_id: String,
    pub mine_timeout: Duration,
}

impl AppState {
    pub fn new(config: &NodeConfig) -> Result<Self, ConsensusError> {
        let mut ledger = Ledger::new(config.difficulty);
        for peer in &config.bootstrap_peers {
            if let Err(e) = ledger.register_peer(peer) {
                warn!("skipping bootstrap peer: {e}");
            }
        }
        Ok(Self {
            ledger: Mutex::new(ledger),
            peer_client: HttpPeerClient::new(config.peer_timeout)?,
            node_id: config.node_id.clone(),
            mine_timeout: config.mine_timeout,
        })
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct NodeInfoResponse {
    pub message: &'static str,
    pub node_id: String,
    pub blocks: usize,
    pub endpoints: &'static [&'static str],
}

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub chain: &'a [Block],
    pub length: usize,
    pub difficulty: u32,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: &'static str,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/* ---------- TX API Models ---------- */

/// Every field is optional so a missing one can be reported as such.
#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Serialize)]
pub struct PendingResponse<'a> {
    pub size: usize,
    pub transactions: &'a [Transaction],
}

/* ---------- Node API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct RegisterNodesResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse<'a> {
    pub message: &'static str,
    pub replaced: bool,
    pub chain: &'a [Block],
}
