use axum::{
    Router,
    extract::{Query, State},
    http::header,
    response::Response,
    routing::get,
};

use crate::{
    dto::video::SequenceVideoQuery,
    error::AppError,
    routes::auth::PlayerIdentity,
    services::video_service::{self, VideoRequest},
    state::SharedState,
};

/// Routes streaming the watch-phase sequence video.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/api/game/sequence.webm", get(sequence_video))
}

/// Stream the player's current canonical sequence as a WebM video.
///
/// The stream is generated from a snapshot of the live session; a failed or
/// aborted render can be retried without losing game progress.
#[utoipa::path(
    get,
    path = "/api/game/sequence.webm",
    tag = "video",
    params(SequenceVideoQuery),
    responses(
        (status = 200, description = "Watch-phase video stream", content_type = "video/webm", body = String),
        (status = 404, description = "No active game"),
        (status = 401, description = "Missing player identity")
    )
)]
pub async fn sequence_video(
    State(state): State<SharedState>,
    identity: PlayerIdentity,
    Query(query): Query<SequenceVideoQuery>,
) -> Result<Response, AppError> {
    let request = VideoRequest {
        size: query.size,
        codec: query.codec.unwrap_or_default(),
        player_turn: query.player_turn.unwrap_or(true),
    };

    let body = video_service::sequence_stream(&state, identity.0, request).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, "video/webm")
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(body)
        .map_err(|err| AppError::Internal(err.to_string()))
}
