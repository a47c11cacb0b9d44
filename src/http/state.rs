use crate::router::EventRouter;
use std::sync::Arc;

/// Shared application state for HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EventRouter>,
}

impl AppState {
    pub fn new(router: Arc<EventRouter>) -> Self {
        Self { router }
    }
}
