pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::api_routes()
}

pub fn alias_router() -> Router<AppState> {
    handlers::alias_routes()
}
