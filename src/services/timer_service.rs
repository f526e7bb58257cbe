//! Arms, resets, and stops the per-player countdowns.
//!
//! Each armed countdown is a spawned task driven by the tokio clock. The
//! task is stamped with a generation number; whenever it wakes up it checks
//! that its generation is still the one installed in the [`TimerEngine`],
//! so a countdown that was stopped or replaced exits without side effects.
//! Expiry finalization happens under the owning player's gate, making it
//! mutually exclusive with move submissions for the same player.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use tokio::time::sleep;
use tracing::debug;
use uuid::Uuid;

use crate::{
    services::game_service,
    state::{AppState, SharedState, TimerHandle},
};

/// Arm a fresh countdown for the player with the given number of ticks.
///
/// Any previously armed countdown for the player is cancelled first, so
/// arming doubles as the atomic stop+arm the engine's callers rely on.
/// Callers must hold the player's gate.
pub fn arm(state: &SharedState, player_id: i64, ticks: i64, event_id: Option<Uuid>) {
    let generation = state.timers().next_generation();
    let remaining = Arc::new(AtomicI64::new(ticks));

    let task = tokio::spawn(countdown(
        Arc::downgrade(state),
        player_id,
        generation,
        Arc::clone(&remaining),
    ));

    state.timers().install(
        player_id,
        TimerHandle::new(generation, remaining, event_id, task.abort_handle()),
    );
}

/// Reset the player's countdown to a new tick budget, keeping the event
/// context supplied by the caller. Equivalent to an atomic stop+arm: there
/// is no window in which the superseded countdown can still fire.
pub fn reset(state: &SharedState, player_id: i64, ticks: i64, event_id: Option<Uuid>) {
    arm(state, player_id, ticks, event_id);
}

/// Cancel the player's countdown. No-op when none is armed.
pub fn stop(state: &SharedState, player_id: i64) {
    state.timers().stop(player_id);
}

/// The countdown task: decrement once per tick, finalize the game when the
/// budget drops below zero.
///
/// Holds only a [`Weak`] reference to the application state so armed timers
/// cannot keep the process state alive during shutdown.
async fn countdown(
    state: Weak<AppState>,
    player_id: i64,
    generation: u64,
    remaining: Arc<AtomicI64>,
) {
    loop {
        let tick = match state.upgrade() {
            Some(state) => state.config().tick(),
            None => return,
        };
        sleep(tick).await;

        let Some(state) = state.upgrade() else { return };
        if !state.timers().is_current(player_id, generation) {
            // Stopped or replaced while we slept.
            return;
        }

        let left = remaining.fetch_sub(1, Ordering::AcqRel) - 1;
        if left >= 0 {
            continue;
        }

        let gate = state.player_gate(player_id);
        let _guard = gate.lock().await;

        // A submission that won the race has already consumed the handle.
        let Some(handle) = state.timers().remove_if_current(player_id, generation) else {
            debug!(player_id, generation, "countdown superseded before expiry; discarding");
            return;
        };

        game_service::finalize_timeout(&state, player_id, handle.event_id()).await;
        return;
    }
}
