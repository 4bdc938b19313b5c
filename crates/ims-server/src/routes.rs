use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{delete_binding, get_auth_vector, get_reg_data, health, put_reg_data, ready};
use crate::state::AppState;

/// The four inbound routes plus `/health` and `/ready` (C10/C11).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/impi/:impi/av", get(get_auth_vector))
        .route("/impu/:impu/reg-data", get(get_reg_data).put(put_reg_data))
        .route("/impi/:impi/:impu", delete(delete_binding))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}
