use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::state::app_state::AppState;
use crate::AppError;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    games: usize,
}

async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        games: app_state.registry.len(),
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
