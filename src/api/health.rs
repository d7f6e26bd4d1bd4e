use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, NodeInfoResponse};

const ENDPOINTS: &[&str] = &[
    "/api/v1/chain/",
    "/api/v1/validate/",
    "/api/v1/mine/",
    "/api/v1/transactions/new/",
    "/api/v1/transactions/pending/",
    "/api/v1/nodes/register/",
    "/api/v1/nodes/resolve/",
];

#[get("/health/")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("Ledger node is up and running 🦀")
}

/// Who this node is and what it serves.
#[get("/")]
pub async fn node_info(state: web::Data<AppState>) -> impl Responder {
    let blocks = state.ledger.lock().expect("mutex poisoned").len();
    HttpResponse::Ok().json(NodeInfoResponse {
        message: "Ledger node active",
        node_id: state.node_id.clone(),
        blocks,
        endpoints: ENDPOINTS,
    })
}
