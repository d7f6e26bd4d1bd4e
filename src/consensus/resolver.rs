use std::sync::Mutex;

use futures_util::future::join_all;
use log::{debug, info, warn};

use super::client::{ChainSnapshot, PeerClient};
use crate::blockchain::{Block, Ledger, ProofOfWork, validate_chain};

/// Pick the longest valid chain among peer snapshots.
///
/// A snapshot only qualifies if its reported length beats the best length
/// seen so far (starting at `local_len`), matches its actual block count and
/// the chain passes validation. On equal lengths the first one seen wins.
pub fn select_longest<I>(local_len: usize, snapshots: I, pow: &ProofOfWork) -> Option<Vec<Block>>
where
    I: IntoIterator<Item = (String, ChainSnapshot)>,
{
    let mut max_length = local_len;
    let mut best = None;

    for (peer, snapshot) in snapshots {
        if snapshot.length <= max_length {
            debug!("peer {peer}: length {} not longer than {max_length}", snapshot.length);
            continue;
        }
        if snapshot.length != snapshot.chain.len() {
            info!(
                "peer {peer}: reported length {} but sent {} blocks, ignored",
                snapshot.length,
                snapshot.chain.len()
            );
            continue;
        }
        if !validate_chain(&snapshot.chain, pow) {
            info!("peer {peer}: chain of length {} is invalid, ignored", snapshot.length);
            continue;
        }

        max_length = snapshot.length;
        best = Some(snapshot.chain);
    }

    best
}

/// Poll every known peer and adopt the longest valid chain, if it is
/// strictly longer than ours.
///
/// Peers are fetched concurrently without holding the ledger lock. A peer
/// that fails or times out is skipped. Returns whether the chain was replaced.
pub async fn resolve<C: PeerClient>(ledger: &Mutex<Ledger>, client: &C) -> bool {
    let (peers, local_len, pow) = {
        let ledger = ledger.lock().expect("mutex poisoned");
        let peers: Vec<String> = ledger.peers().iter().cloned().collect();
        (peers, ledger.len(), ledger.proof_of_work())
    };

    if peers.is_empty() {
        debug!("resolve: no peers registered");
        return false;
    }

    let responses = join_all(peers.iter().map(|peer| client.fetch_chain(peer))).await;

    let snapshots = peers
        .into_iter()
        .zip(responses)
        .filter_map(|(peer, res)| match res {
            Ok(snapshot) => Some((peer, snapshot)),
            Err(e) => {
                warn!("resolve: skipping peer {peer}: {e}");
                None
            }
        });

    let Some(candidate) = select_longest(local_len, snapshots, &pow) else {
        info!("resolve: local chain ({local_len} blocks) is authoritative");
        return false;
    };

    let mut ledger = ledger.lock().expect("mutex poisoned");
    // The local chain may have grown while peers were being polled.
    if candidate.len() <= ledger.len() {
        info!(
            "resolve: local chain grew to {} blocks meanwhile, keeping it",
            ledger.len()
        );
        return false;
    }
    ledger.replace_chain(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsensusError;
    use std::collections::HashMap;

    const DIFFICULTY: u32 = 1;

    /// Canned peer answers; unknown peers are unreachable.
    struct FakePeers {
        answers: HashMap<String, ChainSnapshot>,
    }

    impl PeerClient for FakePeers {
        async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, ConsensusError> {
            self.answers
                .get(peer)
                .cloned()
                .ok_or_else(|| ConsensusError::PeerStatus {
                    peer: peer.to_string(),
                    status: 503,
                })
        }
    }

    fn mined_chain(len: usize) -> Vec<Block> {
        mined_chain_by("miner", len)
    }

    fn mined_chain_by(miner: &str, len: usize) -> Vec<Block> {
        let mut ledger = Ledger::new(DIFFICULTY);
        while ledger.len() < len {
            ledger.register_transaction(miner, "peer", ledger.len() as i64);
            let (last_proof, last_hash) = ledger.mining_target();
            let proof = ledger.proof_of_work().find(last_proof, &last_hash);
            ledger.seal_block(proof, Some(last_hash));
        }
        ledger.chain().to_vec()
    }

    fn snapshot(chain: Vec<Block>) -> ChainSnapshot {
        ChainSnapshot {
            length: chain.len(),
            chain,
        }
    }

    fn tampered(mut chain: Vec<Block>) -> Vec<Block> {
        chain[2].transactions[0].amount += 1000;
        chain
    }

    fn local_ledger(len: usize, peers: &[&str]) -> Mutex<Ledger> {
        let mut ledger = Ledger::new(DIFFICULTY);
        assert!(ledger.replace_chain(mined_chain(len)));
        for peer in peers {
            ledger.register_peer(peer).unwrap();
        }
        Mutex::new(ledger)
    }

    #[test]
    fn select_skips_invalid_longest_and_takes_next_valid() {
        let pow = ProofOfWork::new(DIFFICULTY);
        let five = mined_chain(5);
        let snapshots = vec![
            ("a".to_string(), snapshot(mined_chain(3))),
            ("b".to_string(), snapshot(tampered(mined_chain(7)))),
            ("c".to_string(), snapshot(five.clone())),
        ];
        assert_eq!(select_longest(4, snapshots, &pow), Some(five));
    }

    #[test]
    fn select_keeps_first_seen_on_ties() {
        let pow = ProofOfWork::new(DIFFICULTY);
        let first = mined_chain_by("first", 3);
        let second = mined_chain_by("second", 3);
        let snapshots = vec![
            ("a".to_string(), snapshot(first.clone())),
            ("b".to_string(), snapshot(second)),
        ];
        assert_eq!(select_longest(1, snapshots, &pow), Some(first));
    }

    #[test]
    fn select_ignores_misreported_length() {
        let pow = ProofOfWork::new(DIFFICULTY);
        let mut lying = snapshot(mined_chain(3));
        lying.length = 10;
        assert_eq!(select_longest(2, vec![("a".to_string(), lying)], &pow), None);
    }

    #[test]
    fn select_rejects_equal_length() {
        let pow = ProofOfWork::new(DIFFICULTY);
        let snapshots = vec![("a".to_string(), snapshot(mined_chain(4)))];
        assert_eq!(select_longest(4, snapshots, &pow), None);
    }

    #[actix_web::test]
    async fn resolve_replaces_with_longest_valid_chain() {
        let five = mined_chain(5);
        let peers = FakePeers {
            answers: HashMap::from([
                ("http://peer-a:5000".to_string(), snapshot(mined_chain(3))),
                ("http://peer-b:5000".to_string(), snapshot(tampered(mined_chain(7)))),
                ("http://peer-c:5000".to_string(), snapshot(five.clone())),
            ]),
        };
        let ledger = local_ledger(4, &["peer-a:5000", "peer-b:5000", "peer-c:5000"]);

        assert!(resolve(&ledger, &peers).await);

        let ledger = ledger.lock().unwrap();
        assert_eq!(ledger.len(), 5);
        assert_eq!(ledger.chain(), five.as_slice());
    }

    #[actix_web::test]
    async fn unreachable_peers_are_skipped() {
        let six = mined_chain(6);
        let peers = FakePeers {
            answers: HashMap::from([("http://up:5000".to_string(), snapshot(six.clone()))]),
        };
        let ledger = local_ledger(2, &["down:5000", "up:5000", "also-down:5000"]);

        assert!(resolve(&ledger, &peers).await);
        assert_eq!(ledger.lock().unwrap().chain(), six.as_slice());
    }

    #[actix_web::test]
    async fn local_chain_kept_when_nothing_longer() {
        let peers = FakePeers {
            answers: HashMap::from([
                ("http://a:5000".to_string(), snapshot(mined_chain(2))),
                ("http://b:5000".to_string(), snapshot(tampered(mined_chain(9)))),
            ]),
        };
        let ledger = local_ledger(3, &["a:5000", "b:5000"]);
        let before = ledger.lock().unwrap().chain().to_vec();

        assert!(!resolve(&ledger, &peers).await);
        assert_eq!(ledger.lock().unwrap().chain(), before.as_slice());
    }

    #[actix_web::test]
    async fn no_peers_means_no_replacement() {
        let peers = FakePeers {
            answers: HashMap::new(),
        };
        let ledger = local_ledger(1, &[]);
        assert!(!resolve(&ledger, &peers).await);
    }
}
