use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the store and report whether the backend can serve a game.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let questions_loaded = !state.questions().is_empty();

    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(questions_loaded),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(questions_loaded)
        }
    }
}
