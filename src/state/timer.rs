use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// A single armed countdown for one player.
///
/// The handle never outlives its owning `GameSession`: every code path that
/// removes a session first stops (or atomically consumes) the handle. The
/// `generation` stamps the countdown task so a superseded task can detect it
/// has been replaced and exit without side effects.
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    remaining: Arc<AtomicI64>,
    event_id: Option<Uuid>,
    abort: AbortHandle,
}

impl TimerHandle {
    /// Assemble a handle for a freshly spawned countdown task.
    pub fn new(
        generation: u64,
        remaining: Arc<AtomicI64>,
        event_id: Option<Uuid>,
        abort: AbortHandle,
    ) -> Self {
        Self {
            generation,
            remaining,
            event_id,
            abort,
        }
    }

    /// Tournament context captured when the countdown was armed.
    pub fn event_id(&self) -> Option<Uuid> {
        self.event_id
    }

    /// Ticks left before expiry.
    pub fn remaining_ticks(&self) -> i64 {
        self.remaining.load(Ordering::Acquire)
    }
}

/// Keyed map of per-player countdowns.
///
/// The engine owns only the handles; the ticking itself lives in
/// [`crate::services::timer_service`]. Like [`super::SessionStore`], the maps
/// are only touched under the owning player's gate.
#[derive(Debug, Default)]
pub struct TimerEngine {
    handles: DashMap<i64, TimerHandle>,
    generations: AtomicU64,
}

impl TimerEngine {
    /// Allocate a fresh generation stamp for a new countdown.
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Install a handle for the player, aborting any replaced countdown.
    pub fn install(&self, player_id: i64, handle: TimerHandle) {
        if let Some(previous) = self.handles.insert(player_id, handle) {
            previous.abort.abort();
        }
    }

    /// Cancel and remove the player's countdown. No-op when none is armed
    /// (the player may have already timed out). Once this returns, the
    /// removed countdown can no longer fire: its expiry path re-checks the
    /// map under the player gate before finalizing.
    pub fn stop(&self, player_id: i64) -> bool {
        match self.handles.remove(&player_id) {
            Some((_, handle)) => {
                handle.abort.abort();
                true
            }
            None => false,
        }
    }

    /// True while the given generation is the player's armed countdown.
    pub fn is_current(&self, player_id: i64, generation: u64) -> bool {
        self.handles
            .get(&player_id)
            .is_some_and(|handle| handle.generation == generation)
    }

    /// Atomically claim the handle for expiry, but only if the generation
    /// still matches. A `None` means the countdown was stopped or replaced
    /// in the meantime and the caller must discard its expiry as stale.
    pub fn remove_if_current(&self, player_id: i64, generation: u64) -> Option<TimerHandle> {
        self.handles
            .remove_if(&player_id, |_, handle| handle.generation == generation)
            .map(|(_, handle)| handle)
    }

    /// Ticks left on the player's countdown, if one is armed.
    pub fn remaining_ticks(&self, player_id: i64) -> Option<i64> {
        self.handles
            .get(&player_id)
            .map(|handle| handle.remaining_ticks())
    }

    /// Whether a countdown is currently armed for the player.
    pub fn is_armed(&self, player_id: i64) -> bool {
        self.handles.contains_key(&player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_handle(engine: &TimerEngine, ticks: i64) -> (u64, TimerHandle) {
        let generation = engine.next_generation();
        // A finished task still yields a usable abort handle.
        let task = tokio::spawn(async {});
        let handle = TimerHandle::new(
            generation,
            Arc::new(AtomicI64::new(ticks)),
            None,
            task.abort_handle(),
        );
        (generation, handle)
    }

    #[tokio::test]
    async fn stop_on_absent_player_is_a_no_op() {
        let engine = TimerEngine::default();
        assert!(!engine.stop(42));
        assert!(!engine.stop(42));
    }

    #[tokio::test]
    async fn install_replaces_previous_generation() {
        let engine = TimerEngine::default();
        let (first_gen, first) = dummy_handle(&engine, 3);
        engine.install(9, first);
        assert!(engine.is_current(9, first_gen));

        let (second_gen, second) = dummy_handle(&engine, 5);
        engine.install(9, second);
        assert!(!engine.is_current(9, first_gen));
        assert!(engine.is_current(9, second_gen));
        assert_eq!(engine.remaining_ticks(9), Some(5));
    }

    #[tokio::test]
    async fn remove_if_current_rejects_stale_generations() {
        let engine = TimerEngine::default();
        let (generation, handle) = dummy_handle(&engine, 1);
        engine.install(9, handle);

        assert!(engine.remove_if_current(9, generation + 1).is_none());
        assert!(engine.is_armed(9));
        assert!(engine.remove_if_current(9, generation).is_some());
        assert!(!engine.is_armed(9));
    }
}
