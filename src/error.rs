use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid peer address: {0:?}")]
    InvalidPeerAddress(String),

    /// The chain tip moved while a proof was being searched.
    #[error("chain tip changed since mining started (expected previous hash {expected})")]
    StaleTip { expected: String },
}

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("request to peer failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("peer {peer} answered with status {status}")]
    PeerStatus { peer: String, status: u16 },
}
