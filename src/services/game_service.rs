//! Game progression: start, countdown confirmation, move validation, and
//! the shared finalization path used by wrong moves, abandonment, and timer
//! expiry.
//!
//! Every operation locks the player's gate before touching the session or
//! timer maps, which makes concurrent submissions, restarts, and expiries
//! for the same player mutually exclusive. Finalization follows a strict
//! order: the countdown is stopped first, the session is deleted next, and
//! only then is the score handed to the persistence collaborator.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::score_store::ScoreRecord,
    dto::game::{AdvanceTimerResponse, GameOverResponse, StartGameResponse, SubmitMoveResponse},
    error::ServiceError,
    services::timer_service,
    state::{GameSession, Pad, SharedState},
};

/// Start a new run for the player, silently replacing any live session.
///
/// The prior countdown is always cancelled before the replacement session is
/// installed, so an orphaned timer can never finalize the new run.
pub async fn start_game(
    state: &SharedState,
    player_id: i64,
    event_id: Option<Uuid>,
) -> StartGameResponse {
    let gate = state.player_gate(player_id);
    let _guard = gate.lock().await;

    timer_service::stop(state, player_id);

    let session = GameSession::start(event_id);
    let ticks = state.config().ticks_for_level(session.level);
    let response = StartGameResponse::from_session(&session, ticks);

    state.sessions().create(player_id, session);
    timer_service::arm(state, player_id, ticks, event_id);

    info!(player_id, event = ?event_id, "started a new game");
    response
}

/// Re-arm the countdown once the client is ready to answer, returning the
/// granted budget.
pub async fn advance_timer(
    state: &SharedState,
    player_id: i64,
) -> Result<AdvanceTimerResponse, ServiceError> {
    let gate = state.player_gate(player_id);
    let _guard = gate.lock().await;

    let session = state
        .sessions()
        .get(player_id)
        .ok_or(ServiceError::NoActiveSession)?;

    let ticks = state.config().ticks_for_level(session.level);
    timer_service::reset(state, player_id, ticks, session.event_id);

    Ok(AdvanceTimerResponse {
        remaining_seconds: ticks,
    })
}

/// Validate a submitted move sequence against the canonical one.
///
/// A full match advances the session to the next level with a freshly drawn
/// sequence and a reset countdown; any divergence ends the game with the
/// last completed level as score.
pub async fn submit_move(
    state: &SharedState,
    player_id: i64,
    moves: Vec<Pad>,
) -> Result<SubmitMoveResponse, ServiceError> {
    if moves.is_empty() {
        return Err(ServiceError::InvalidInput(
            "move sequence must not be empty".into(),
        ));
    }

    let gate = state.player_gate(player_id);
    let _guard = gate.lock().await;

    let Some(mut session) = state.sessions().get(player_id) else {
        return Err(ServiceError::NoActiveSession);
    };

    if moves == session.sequence {
        session.advance();
        let ticks = state.config().ticks_for_level(session.level);
        let response = SubmitMoveResponse::next_level(&session, ticks);

        state.sessions().create(player_id, session.clone());
        timer_service::reset(state, player_id, ticks, session.event_id);

        info!(player_id, level = session.level, "correct move; advancing");
        return Ok(response);
    }

    info!(
        player_id,
        level = session.level,
        "wrong move; finalizing game"
    );
    let score = finalize(state, player_id, session.event_id).await;
    Ok(SubmitMoveResponse::game_over(score))
}

/// Explicitly give up the live run, finalizing it like a wrong move.
pub async fn abandon(
    state: &SharedState,
    player_id: i64,
) -> Result<GameOverResponse, ServiceError> {
    let gate = state.player_gate(player_id);
    let _guard = gate.lock().await;

    let Some(session) = state.sessions().get(player_id) else {
        return Err(ServiceError::NoActiveSession);
    };

    info!(player_id, level = session.level, "player abandoned the game");
    let score = finalize(state, player_id, session.event_id).await;
    Ok(GameOverResponse { score })
}

/// Finalization invoked by the countdown task at expiry.
///
/// The caller holds the player's gate and has already consumed the timer
/// handle; a missing session means the expiry lost a race against another
/// finalizer and is discarded as stale.
pub(crate) async fn finalize_timeout(
    state: &SharedState,
    player_id: i64,
    event_id: Option<Uuid>,
) {
    let Some(session) = state.sessions().delete(player_id) else {
        return;
    };

    let score = session.final_score();
    info!(player_id, score, event = ?event_id, "countdown expired; finalizing game");
    record_score(state, player_id, score, event_id).await;
}

/// Shared teardown for wrong moves and abandonment. Caller holds the gate.
///
/// Ordering contract: stop the countdown, delete the session, then report
/// the score; a concurrent expiry can therefore never double-report.
async fn finalize(state: &SharedState, player_id: i64, event_id: Option<Uuid>) -> u32 {
    timer_service::stop(state, player_id);

    let score = state
        .sessions()
        .delete(player_id)
        .map(|session| session.final_score())
        .unwrap_or_default();

    record_score(state, player_id, score, event_id).await;
    score
}

/// Hand the score to the persistence collaborator. Fire-and-forget:
/// failures are logged and never retried.
async fn record_score(state: &SharedState, player_id: i64, score: u32, event_id: Option<Uuid>) {
    match state.score_store().await {
        Some(store) => {
            let record = ScoreRecord {
                player_id,
                score,
                event_id,
            };
            if let Err(err) = store.record_score(record).await {
                warn!(error = %err, player_id, score, "failed to record score");
            }
        }
        None => {
            warn!(player_id, score, "score store unavailable (degraded mode); dropping score");
        }
    }
}
