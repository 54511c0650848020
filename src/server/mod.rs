pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;

use crate::coach::Coach;

#[derive(Clone)]
pub struct AppState {
    pub coach: Arc<Coach>,
}

pub fn create_app(state: AppState) -> Router {
    routes::build_router(state)
}
