use crate::state::AppState;
use axum::Router;

mod snapshot;

pub fn create_routes(state: AppState) -> Router {
    Router::new().merge(snapshot::routes(state))
}
