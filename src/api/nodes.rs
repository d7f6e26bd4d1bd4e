use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{AppState, RegisterNodesRequest, RegisterNodesResponse, ResolveResponse};
use crate::blockchain::ledger::normalize_peer;
use crate::consensus::resolve;

/// Register peer addresses. The whole list is checked before any is stored.
#[post("/nodes/register/")]
pub async fn register_nodes(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodesRequest>,
) -> impl Responder {
    let Some(nodes) = body.into_inner().nodes else {
        return HttpResponse::BadRequest().body("Error: please supply a list of nodes");
    };

    if let Some(err) = nodes.iter().find_map(|n| normalize_peer(n).err()) {
        warn!("POST /nodes/register/ - rejected: {err}");
        return HttpResponse::BadRequest().body(err.to_string());
    }

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    for node in &nodes {
        if let Err(e) = ledger.register_peer(node) {
            // Already normalized once above.
            warn!("POST /nodes/register/ - {e}");
        }
    }
    info!("peers registered, {} known", ledger.peers().len());

    HttpResponse::Created().json(RegisterNodesResponse {
        message: "New nodes have been added",
        total_nodes: ledger.peers().iter().cloned().collect(),
    })
}

/// Run longest-valid-chain consensus against every known peer.
#[get("/nodes/resolve/")]
pub async fn resolve_nodes(state: web::Data<AppState>) -> impl Responder {
    let replaced = resolve(&state.ledger, &state.peer_client).await;

    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ResolveResponse {
        message: if replaced {
            "Our chain was replaced"
        } else {
            "Our chain is authoritative"
        },
        replaced,
        chain: ledger.chain(),
    })
}
