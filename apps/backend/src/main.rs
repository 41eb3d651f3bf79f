use std::process;

use actix_web::{web, App, HttpServer};
use tracing::{error, info, warn};
use wildcards_backend::config::{GameConfig, ServerConfig};
use wildcards_backend::routes;
use wildcards_backend::services::card_packs::CardPacks;
use wildcards_backend::state::app_state::AppState;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables are set by the runtime environment
    // (docker env_file, or sourced manually for local runs).
    let server = ServerConfig::from_env().unwrap_or_else(|e| {
        error!(error = %e, "invalid server configuration");
        process::exit(1);
    });
    let game_config = GameConfig::from_env().unwrap_or_else(|e| {
        error!(error = %e, "invalid game configuration");
        process::exit(1);
    });

    let packs = CardPacks::load_dir(&server.cards_dir).unwrap_or_else(|e| {
        error!(error = %e, dir = %server.cards_dir.display(), "cannot load card packs");
        process::exit(1);
    });
    if packs.is_empty() {
        warn!(dir = %server.cards_dir.display(), "no card packs loaded; games cannot be created");
    }

    let data = web::Data::new(AppState::new(packs, game_config));

    info!(host = %server.host, port = server.port, "starting wildcards backend");

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}
