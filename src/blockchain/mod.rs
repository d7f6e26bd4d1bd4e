pub mod block;
pub mod hash;
pub mod ledger;
pub mod proof;

pub use block::Block;
pub use ledger::{Ledger, validate_chain};
pub use proof::ProofOfWork;

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Amount credited to the node that seals a block.
pub const MINING_REWARD: i64 = 1;
