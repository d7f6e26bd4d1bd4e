use std::sync::atomic::{AtomicBool, Ordering};

use super::hash::sha256_hex;

/// How many trials run between two looks at the cancel flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Proof-of-Work predicate and nonce search.
///
/// A proof `p` is valid for the previous block when
/// `sha256("{last_proof}{p}{last_hash}")` starts with `difficulty` hex zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    pub difficulty: u32,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Self {
        Self { difficulty }
    }

    pub fn is_valid(&self, last_proof: u64, proof: u64, last_hash: &str) -> bool {
        let guess = format!("{last_proof}{proof}{last_hash}");
        let digest = sha256_hex(guess.as_bytes());
        let zeros = self.difficulty as usize;
        digest.len() >= zeros && digest.bytes().take(zeros).all(|b| b == b'0')
    }

    /// Smallest non-negative proof for the given previous block. Unbounded:
    /// expected cost is `16^difficulty` trials.
    pub fn find(&self, last_proof: u64, last_hash: &str) -> u64 {
        let mut proof: u64 = 0;
        while !self.is_valid(last_proof, proof, last_hash) {
            proof = proof.wrapping_add(1);
        }
        proof
    }

    /// Same search as [`find`](Self::find), giving up with `None` once
    /// `cancel` is set.
    pub fn search(&self, last_proof: u64, last_hash: &str, cancel: &AtomicBool) -> Option<u64> {
        let mut proof: u64 = 0;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return None;
            }
            if self.is_valid(last_proof, proof, last_hash) {
                return Some(proof);
            }
            proof = proof.checked_add(1)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAST_HASH: &str = "8c5e7b0f6fdd0c59b4a1c3e0d2f5a7e9b1c3d5e7f9a1b3c5d7e9f1a3b5c7d9e1";

    #[test]
    fn found_proof_is_valid_and_minimal() {
        for difficulty in 1..=3 {
            let pow = ProofOfWork::new(difficulty);
            let proof = pow.find(100, LAST_HASH);
            assert!(pow.is_valid(100, proof, LAST_HASH));
            assert!((0..proof).all(|p| !pow.is_valid(100, p, LAST_HASH)));
        }
    }

    #[test]
    fn search_is_deterministic() {
        let pow = ProofOfWork::new(2);
        assert_eq!(pow.find(7, "abc"), pow.find(7, "abc"));
    }

    #[test]
    fn predicate_matches_digest_prefix() {
        let pow = ProofOfWork::new(2);
        for proof in 0..64 {
            let digest = sha256_hex(format!("100{proof}{LAST_HASH}").as_bytes());
            assert_eq!(pow.is_valid(100, proof, LAST_HASH), digest.starts_with("00"));
        }
    }

    #[test]
    fn impossible_difficulty_is_never_valid() {
        let pow = ProofOfWork::new(65);
        assert!(!pow.is_valid(0, 0, ""));
    }

    #[test]
    fn zero_difficulty_accepts_first_candidate() {
        let pow = ProofOfWork::new(0);
        assert_eq!(pow.find(1, "x"), 0);
    }

    #[test]
    fn uncancelled_search_matches_find() {
        let pow = ProofOfWork::new(2);
        let cancel = AtomicBool::new(false);
        assert_eq!(pow.search(100, LAST_HASH, &cancel), Some(pow.find(100, LAST_HASH)));
    }

    #[test]
    fn cancelled_search_returns_none() {
        let pow = ProofOfWork::new(64);
        let cancel = AtomicBool::new(true);
        assert_eq!(pow.search(1, "x", &cancel), None);
    }
}
