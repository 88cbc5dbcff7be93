use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::engine::service::SessionService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SessionService>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<SessionService> {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
