pub mod health;
pub mod holding_times;
pub mod screen;

use crate::domain::Address;
use crate::error::AppError;
use crate::orchestration::Analyzer;
use axum::{routing::get, Router};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }
}

pub(crate) fn parse_user_address(input: &str) -> Result<Address, AppError> {
    Address::from_str(input).map_err(|_| AppError::BadRequest("Invalid user address".to_string()))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/holding-times", get(holding_times::get_holding_times))
        .route("/v1/screen", get(screen::get_screen))
        .layer(cors)
        .with_state(state)
}
