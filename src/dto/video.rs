use serde::Deserialize;
use utoipa::IntoParams;

use crate::services::encoder_service::Codec;

/// Query parameters accepted by the watch-phase video endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct SequenceVideoQuery {
    /// Requested square edge in pixels; clamped server-side.
    pub size: Option<u32>,
    /// Codec profile; defaults to VP9.
    pub codec: Option<Codec>,
    /// Whether the viewer may answer while watching; defaults to true.
    pub player_turn: Option<bool>,
    /// Cache-buster echoed by clients; ignored by the server.
    pub t: Option<String>,
}
