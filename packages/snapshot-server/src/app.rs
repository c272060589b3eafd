use crate::routes;
use crate::state::AppState;
use crate::utils::config::CONFIG;
use axum::Router;

pub fn create_app() -> Router {
    let state = AppState::load(&CONFIG.data_dir);
    create_app_with_state(state)
}

pub fn create_app_with_state(state: AppState) -> Router {
    routes::create_routes(state)
}
