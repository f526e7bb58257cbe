use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health payload while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.score_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "score store health check failed");
            }
            HealthResponse::ok(state.sessions().active_count())
        }
        None => {
            warn!("score store unavailable (degraded mode)");
            HealthResponse::degraded(state.sessions().active_count())
        }
    }
}
