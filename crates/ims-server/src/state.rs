use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ims_cache::Coordinator;

/// Shared application state handed to every axum handler via the `State`
/// extractor. `ready` flips to true once the coordinator is fully wired;
/// `/ready` reports it so a load balancer doesn't route traffic at a process
/// that's still starting up.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            ready: Arc::new(AtomicBool::new(true)),
        }
    }
}
