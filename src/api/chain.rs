use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::rt::time::sleep;
use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, error, info, warn};

use super::models::{AppState, ChainResponse, MineResponse, ValidateResponse};
use crate::blockchain::MINING_REWARD;
use crate::transaction::Transaction;

/// Get the full chain. Peers read this route during consensus.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let resp = ChainResponse {
        chain: ledger.chain(),
        length: ledger.len(),
        difficulty: ledger.difficulty(),
    };
    HttpResponse::Ok().json(resp)
}

/// Validate the whole local chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let resp = ValidateResponse {
        valid: ledger.is_valid(),
        length: ledger.len(),
        difficulty: ledger.difficulty(),
    };
    HttpResponse::Ok().json(resp)
}

/// Mine a new block from the pending pool:
/// - Snapshot the tip's proof and hash
/// - Search the proof on the blocking pool, cancelled after `mine_timeout`
/// - Credit the reward to this node and seal, unless the tip moved meanwhile
///
/// One miner per process is expected; a concurrent seal or chain
/// replacement makes this attempt fail with 409 instead of forking.
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let (last_proof, last_hash, pow) = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        let (last_proof, last_hash) = ledger.mining_target();
        (last_proof, last_hash, ledger.proof_of_work())
    }; // release the ledger before PoW

    let cancel = Arc::new(AtomicBool::new(false));
    let timer = {
        let cancel = Arc::clone(&cancel);
        let timeout = state.mine_timeout;
        actix_web::rt::spawn(async move {
            sleep(timeout).await;
            cancel.store(true, Ordering::Relaxed);
        })
    };

    debug!(
        "MINER - searching proof (difficulty={}, last_proof={})",
        pow.difficulty, last_proof
    );
    let search_hash = last_hash.clone();
    let search_cancel = Arc::clone(&cancel);
    let found = web::block(move || pow.search(last_proof, &search_hash, &search_cancel)).await;
    timer.abort();

    let proof = match found {
        Ok(Some(proof)) => proof,
        Ok(None) => {
            warn!("MINER - proof search cancelled after {:?}", state.mine_timeout);
            return HttpResponse::ServiceUnavailable().body("proof search timed out");
        }
        Err(e) => {
            error!("MINER - proof search worker failed: {e}");
            return HttpResponse::InternalServerError().body("proof search failed");
        }
    };

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    let reward = Transaction::reward(state.node_id.clone(), MINING_REWARD);
    match ledger.seal_mined(proof, &last_hash, reward) {
        Ok(block) => {
            info!(
                "MINER - sealed block #{} (proof={}, txs={})",
                block.index,
                block.proof,
                block.transactions.len()
            );
            HttpResponse::Ok().json(MineResponse {
                message: "New block forged",
                index: block.index,
                transactions: block.transactions.clone(),
                proof: block.proof,
                previous_hash: block.previous_hash.clone(),
            })
        }
        Err(e) => {
            warn!("MINER - discarding proof {proof}: {e}");
            HttpResponse::Conflict().body(e.to_string())
        }
    }
}
