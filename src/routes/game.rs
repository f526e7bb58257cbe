use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::game::{
        AdvanceTimerResponse, GameOverResponse, StartGameRequest, StartGameResponse,
        SubmitMoveRequest, SubmitMoveResponse,
    },
    error::AppError,
    routes::auth::PlayerIdentity,
    services::game_service,
    state::SharedState,
};

/// Routes driving the live game session lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/game/start", post(start_game))
        .route("/api/game/timer", post(advance_timer))
        .route("/api/game/move", post(submit_move))
        .route("/api/game/abandon", post(abandon))
}

/// Start a new run, replacing any live session for the player.
#[utoipa::path(
    post,
    path = "/api/game/start",
    tag = "game",
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Game started", body = StartGameResponse),
        (status = 401, description = "Missing player identity")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    identity: PlayerIdentity,
    Json(payload): Json<StartGameRequest>,
) -> Json<StartGameResponse> {
    let started = game_service::start_game(&state, identity.0, payload.event_id).await;
    Json(started)
}

/// Re-arm the countdown once the client is ready to answer.
#[utoipa::path(
    post,
    path = "/api/game/timer",
    tag = "game",
    responses(
        (status = 200, description = "Countdown confirmed", body = AdvanceTimerResponse),
        (status = 404, description = "No active game")
    )
)]
pub async fn advance_timer(
    State(state): State<SharedState>,
    identity: PlayerIdentity,
) -> Result<Json<AdvanceTimerResponse>, AppError> {
    let remaining = game_service::advance_timer(&state, identity.0).await?;
    Ok(Json(remaining))
}

/// Validate a submitted move sequence against the canonical one.
#[utoipa::path(
    post,
    path = "/api/game/move",
    tag = "game",
    request_body = SubmitMoveRequest,
    responses(
        (status = 200, description = "Move evaluated", body = SubmitMoveResponse),
        (status = 400, description = "Malformed move sequence"),
        (status = 404, description = "No active game")
    )
)]
pub async fn submit_move(
    State(state): State<SharedState>,
    identity: PlayerIdentity,
    Json(payload): Json<SubmitMoveRequest>,
) -> Result<Json<SubmitMoveResponse>, AppError> {
    payload.validate()?;
    let outcome = game_service::submit_move(&state, identity.0, payload.moves).await?;
    Ok(Json(outcome))
}

/// Explicitly give up the live run.
#[utoipa::path(
    post,
    path = "/api/game/abandon",
    tag = "game",
    responses(
        (status = 200, description = "Game abandoned", body = GameOverResponse),
        (status = 404, description = "No active game")
    )
)]
pub async fn abandon(
    State(state): State<SharedState>,
    identity: PlayerIdentity,
) -> Result<Json<GameOverResponse>, AppError> {
    let outcome = game_service::abandon(&state, identity.0).await?;
    Ok(Json(outcome))
}
