pub mod session;
pub mod timer;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};

use crate::{config::AppConfig, dao::score_store::ScoreStore};

pub use self::session::{GameSession, Pad, SessionStore, random_sequence};
pub use self::timer::{TimerEngine, TimerHandle};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state owning the two keyed maps of the game engine
/// (sessions and timers), the per-player exclusion gates that serialize
/// mutations on them, and the persistence collaborator slot.
///
/// Constructed once per process and passed to every caller; nothing in the
/// engine reaches for ambient globals.
pub struct AppState {
    config: AppConfig,
    sessions: SessionStore,
    timers: TimerEngine,
    gates: DashMap<i64, Arc<Mutex<()>>>,
    scores: RwLock<Option<Arc<dyn ScoreStore>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts without a score store (degraded mode) until one
    /// is installed at startup.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            sessions: SessionStore::default(),
            timers: TimerEngine::default(),
            gates: DashMap::new(),
            scores: RwLock::new(None),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Keyed map of live game sessions.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Keyed map of armed countdowns.
    pub fn timers(&self) -> &TimerEngine {
        &self.timers
    }

    /// Exclusive slot for the player: every mutating operation on a player's
    /// session/timer pair (start, advance, submit, abandon, timer expiry)
    /// locks this gate first, so two of them can never interleave.
    pub fn player_gate(&self, player_id: i64) -> Arc<Mutex<()>> {
        self.gates
            .entry(player_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.scores.read().await;
        guard.as_ref().cloned()
    }

    /// Install a score store implementation and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        let mut guard = self.scores.write().await;
        *guard = Some(store);
    }
}
