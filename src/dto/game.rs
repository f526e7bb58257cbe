use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::state::{GameSession, Pad};

/// Longest move sequence a client may submit; canonical sequences stay far
/// below this in practice.
const MAX_MOVES: u64 = 64;

/// Payload used to start a new run.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartGameRequest {
    /// Tournament instance this run counts towards; omit for free play.
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

/// Summary returned once a run has been started.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartGameResponse {
    pub level: u32,
    /// Opaque token for the current level's watch-phase video.
    pub sequence_token: Uuid,
    /// Where to fetch the watch-phase video, cache-busted per level.
    pub video_url: String,
    /// Seconds granted to answer once the countdown runs.
    pub answer_seconds: i64,
}

impl StartGameResponse {
    pub(crate) fn from_session(session: &GameSession, answer_seconds: i64) -> Self {
        Self {
            level: session.level,
            sequence_token: session.sequence_token,
            video_url: video_url(session.sequence_token),
            answer_seconds,
        }
    }
}

/// Countdown budget confirmed by the timer endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdvanceTimerResponse {
    /// Seconds left before the run is finalized server-side.
    pub remaining_seconds: i64,
}

/// A candidate move sequence submitted by the client.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitMoveRequest {
    /// Pads tapped by the player, in order.
    #[validate(length(min = 1, max = 64, message = "move sequence has an invalid length"))]
    pub moves: Vec<Pad>,
}

/// Outcome of a move submission.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SubmitMoveResponse {
    /// The full sequence matched; a new level awaits.
    NextLevel {
        /// New level (and length of the new canonical sequence).
        level: u32,
        /// Token for the next watch-phase video.
        sequence_token: Uuid,
        /// Where to fetch the next watch-phase video.
        video_url: String,
        /// Seconds granted to answer the new level.
        answer_seconds: i64,
    },
    /// The sequence diverged; the run is over.
    GameOver {
        /// Last fully completed level.
        score: u32,
    },
}

impl SubmitMoveResponse {
    pub(crate) fn next_level(session: &GameSession, answer_seconds: i64) -> Self {
        SubmitMoveResponse::NextLevel {
            level: session.level,
            sequence_token: session.sequence_token,
            video_url: video_url(session.sequence_token),
            answer_seconds,
        }
    }

    pub(crate) fn game_over(score: u32) -> Self {
        SubmitMoveResponse::GameOver { score }
    }
}

/// Final score returned when a run is explicitly abandoned.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameOverResponse {
    /// Last fully completed level.
    pub score: u32,
}

fn video_url(token: Uuid) -> String {
    format!("/api/game/sequence.webm?t={token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_shape_bounds_are_enforced() {
        let empty = SubmitMoveRequest { moves: vec![] };
        assert!(empty.validate().is_err());

        let oversized = SubmitMoveRequest {
            moves: vec![Pad::Red; MAX_MOVES as usize + 1],
        };
        assert!(oversized.validate().is_err());

        let reasonable = SubmitMoveRequest {
            moves: vec![Pad::Red, Pad::Blue],
        };
        assert!(reasonable.validate().is_ok());
    }

    #[test]
    fn move_outcomes_serialize_with_an_action_tag() {
        let over = serde_json::to_value(SubmitMoveResponse::game_over(3)).expect("serialize");
        assert_eq!(over["action"], "game_over");
        assert_eq!(over["score"], 3);

        let session = GameSession::start(None);
        let next = serde_json::to_value(SubmitMoveResponse::next_level(&session, 1))
            .expect("serialize");
        assert_eq!(next["action"], "next_level");
        assert_eq!(next["level"], 1);
    }
}
