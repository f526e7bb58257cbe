use dashmap::DashMap;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One of the four colored pads the player has to memorize and reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Pad {
    /// Top-left pad.
    Green,
    /// Top-right pad.
    Red,
    /// Bottom-left pad.
    Yellow,
    /// Bottom-right pad.
    Blue,
}

impl Pad {
    /// The full pad alphabet, in grid order.
    pub const ALL: [Pad; 4] = [Pad::Green, Pad::Red, Pad::Yellow, Pad::Blue];
}

/// Draw a uniformly random pad sequence of the requested length.
pub fn random_sequence(length: usize) -> Vec<Pad> {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| Pad::ALL.choose(&mut rng).copied().unwrap_or(Pad::Green))
        .collect()
}

/// Live per-player game record: the current level and its canonical sequence.
///
/// The sequence is the server-held correct answer for the level and is never
/// sent to the client in clear form; clients only ever see it rendered as the
/// watch-phase video.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Current required sequence length; starts at 1.
    pub level: u32,
    /// Canonical sequence for the current level (`len == level`).
    pub sequence: Vec<Pad>,
    /// Tournament instance this run counts towards; `None` is free play.
    pub event_id: Option<Uuid>,
    /// Opaque token regenerated on every level advance, used by clients as a
    /// cache-buster when fetching the watch-phase video.
    pub sequence_token: Uuid,
}

impl GameSession {
    /// Build a fresh level-1 session with a newly drawn sequence.
    pub fn start(event_id: Option<Uuid>) -> Self {
        Self {
            level: 1,
            sequence: random_sequence(1),
            event_id,
            sequence_token: Uuid::new_v4(),
        }
    }

    /// Move to the next level: bump the level, draw a full new canonical
    /// sequence of the new length, and rotate the sequence token.
    pub fn advance(&mut self) {
        self.level += 1;
        self.sequence = random_sequence(self.level as usize);
        self.sequence_token = Uuid::new_v4();
    }

    /// Score awarded when this session ends: the last fully completed level.
    pub fn final_score(&self) -> u32 {
        self.level.saturating_sub(1)
    }
}

/// Keyed map of live sessions, one per player.
///
/// The store holds no locks of its own; callers serialize mutations per
/// player through [`crate::state::AppState::player_gate`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<i64, GameSession>,
}

impl SessionStore {
    /// Install a session for the player, overwriting any existing one.
    ///
    /// Ordering contract: the caller must have cancelled the player's prior
    /// timer before replacing a live session.
    pub fn create(&self, player_id: i64, session: GameSession) {
        self.sessions.insert(player_id, session);
    }

    /// Snapshot the player's session, if any.
    pub fn get(&self, player_id: i64) -> Option<GameSession> {
        self.sessions.get(&player_id).map(|entry| entry.clone())
    }

    /// Remove the player's session, returning it so finalizers can compute
    /// the score. Idempotent: removing an absent session yields `None`.
    pub fn delete(&self, player_id: i64) -> Option<GameSession> {
        self.sessions.remove(&player_id).map(|(_, session)| session)
    }

    /// Number of currently live sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_sequence_has_requested_length() {
        for length in 1..=16 {
            assert_eq!(random_sequence(length).len(), length);
        }
    }

    #[test]
    fn fresh_session_is_level_one() {
        let session = GameSession::start(None);
        assert_eq!(session.level, 1);
        assert_eq!(session.sequence.len(), 1);
        assert_eq!(session.final_score(), 0);
    }

    #[test]
    fn advance_keeps_sequence_length_in_step_with_level() {
        let mut session = GameSession::start(None);
        let first_token = session.sequence_token;
        for expected_level in 2..=10 {
            session.advance();
            assert_eq!(session.level, expected_level);
            assert_eq!(session.sequence.len(), expected_level as usize);
        }
        assert_ne!(session.sequence_token, first_token);
        assert_eq!(session.final_score(), 9);
    }

    #[test]
    fn create_replaces_existing_session() {
        let store = SessionStore::default();
        store.create(7, GameSession::start(None));
        let mut next = GameSession::start(None);
        next.advance();
        store.create(7, next);
        assert_eq!(store.get(7).map(|s| s.level), Some(2));
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = SessionStore::default();
        store.create(7, GameSession::start(None));
        assert!(store.delete(7).is_some());
        assert!(store.delete(7).is_none());
        assert!(store.get(7).is_none());
    }
}
