mod api;
mod blockchain;
mod config;
mod consensus;
mod error;
mod transaction;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use api::AppState;
use config::NodeConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);

    println!("⛓️ Starting ledger node at http://{host}:{port}");
    info!(
        "node id {} (difficulty={}, peers={})",
        config.node_id,
        config.difficulty,
        config.bootstrap_peers.len()
    );

    let state = web::Data::new(AppState::new(&config).map_err(std::io::Error::other)?);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
