use std::collections::BTreeSet;

use log::{debug, info};
use url::Url;

use super::{Block, ProofOfWork};
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// Scheme assumed for peers registered as bare `host[:port]`.
pub const DEFAULT_PEER_SCHEME: &str = "http";

/// In-memory ledger: the chain, the pending pool and the known peers.
///
/// The chain is never empty; it starts with the genesis block and only grows
/// by [`seal_block`](Self::seal_block) or is swapped whole by
/// [`replace_chain`](Self::replace_chain).
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peers: BTreeSet<String>,
    pow: ProofOfWork,
}

impl Ledger {
    /// Initialize a new ledger with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            peers: BTreeSet::new(),
            pow: ProofOfWork::new(difficulty),
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn peers(&self) -> &BTreeSet<String> {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.pow.difficulty
    }

    pub fn proof_of_work(&self) -> ProofOfWork {
        self.pow
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    /// Inputs a miner needs to search for the next proof: the tip's proof
    /// and the tip's hash.
    pub fn mining_target(&self) -> (u64, String) {
        let last = self.last_block();
        (last.proof, last.hash())
    }

    /// Queue a transaction. Returns the index of the block it will most
    /// likely land in.
    pub fn register_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: i64,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, recipient, amount));
        debug!("pending pool size now {}", self.pending.len());
        self.last_block().index + 1
    }

    /// Seal the whole pending pool into a new block and append it.
    /// `previous_hash` defaults to the hash of the current tip.
    pub fn seal_block(&mut self, proof: u64, previous_hash: Option<String>) -> &Block {
        let previous_hash = previous_hash.unwrap_or_else(|| self.last_block().hash());
        let transactions = std::mem::take(&mut self.pending);
        let block = Block::new(
            self.chain.len() as u64 + 1,
            transactions,
            proof,
            previous_hash,
        );
        info!(
            "sealed block #{} ({} txs, proof={})",
            block.index,
            block.transactions.len(),
            block.proof
        );
        self.chain.push(block);
        self.last_block()
    }

    /// Commit a proof found off-lock against `expected_previous_hash`.
    ///
    /// Fails without touching anything if the tip moved in the meantime;
    /// otherwise queues `reward` and seals.
    pub fn seal_mined(
        &mut self,
        proof: u64,
        expected_previous_hash: &str,
        reward: Transaction,
    ) -> Result<&Block, LedgerError> {
        let (last_proof, tip_hash) = self.mining_target();
        if tip_hash != expected_previous_hash
            || !self.pow.is_valid(last_proof, proof, expected_previous_hash)
        {
            return Err(LedgerError::StaleTip {
                expected: expected_previous_hash.to_string(),
            });
        }
        self.pending.push(reward);
        Ok(self.seal_block(proof, Some(tip_hash)))
    }

    /// Check a chain (ours or a peer's) with this ledger's difficulty.
    pub fn validate_chain(&self, chain: &[Block]) -> bool {
        validate_chain(chain, &self.pow)
    }

    pub fn is_valid(&self) -> bool {
        self.validate_chain(&self.chain)
    }

    /// Swap in a whole new chain. Empty chains are refused so the genesis
    /// invariant holds.
    pub fn replace_chain(&mut self, chain: Vec<Block>) -> bool {
        if chain.is_empty() {
            return false;
        }
        info!("chain replaced: {} -> {} blocks", self.chain.len(), chain.len());
        self.chain = chain;
        true
    }

    /// Normalize and remember a peer. Returns the stored form.
    pub fn register_peer(&mut self, address: &str) -> Result<String, LedgerError> {
        let peer = normalize_peer(address)?;
        if self.peers.insert(peer.clone()) {
            debug!("registered peer {peer}");
        }
        Ok(peer)
    }
}

/// Walk adjacent pairs checking hash linkage and proof-of-work.
///
/// An empty chain has no genesis and is rejected; a lone block is valid.
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> bool {
    if chain.is_empty() {
        return false;
    }

    for pair in chain.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);

        if current.previous_hash != prev.hash() {
            debug!("block #{} does not link to its predecessor", current.index);
            return false;
        }

        if !pow.is_valid(prev.proof, current.proof, &current.previous_hash) {
            debug!("block #{} carries an invalid proof", current.index);
            return false;
        }
    }

    true
}

/// `scheme://host[:port]`, with a default scheme for bare `host[:port]`.
/// Paths, queries and trailing slashes are dropped.
pub fn normalize_peer(address: &str) -> Result<String, LedgerError> {
    let invalid = || LedgerError::InvalidPeerAddress(address.to_string());

    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_PEER_SCHEME}://{trimmed}")
    };

    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(invalid)?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
