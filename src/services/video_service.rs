//! Produces the watch-phase video stream for a player's live session.
//!
//! The video is computed from a snapshot of the session taken before the
//! encoder is spawned: a failed or cancelled render never touches the
//! session or its countdown, so the client can simply retry.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use tracing::info;

use crate::{
    error::ServiceError,
    render::{
        frames::{FrameDescriptor, watch_plan},
        raster::render_frame,
    },
    services::encoder_service::{self, Codec, EncoderProcess},
    state::{Pad, SharedState},
};

/// Client-tunable parameters of one video request.
#[derive(Debug, Clone, Copy)]
pub struct VideoRequest {
    /// Requested square edge in pixels; clamped to the configured bounds.
    pub size: Option<u32>,
    /// Codec profile to encode with.
    pub codec: Codec,
    /// Whether the viewer may answer while watching; pads are dimmed when not.
    pub player_turn: bool,
}

/// Render and encode the player's canonical sequence as a live WebM stream.
///
/// Fails with [`ServiceError::NoActiveSession`] before any subprocess is
/// spawned when the player has no live session.
pub async fn sequence_stream(
    state: &SharedState,
    player_id: i64,
    request: VideoRequest,
) -> Result<Body, ServiceError> {
    let Some(session) = state.sessions().get(player_id) else {
        return Err(ServiceError::NoActiveSession);
    };

    let config = state.config();
    let size = config.clamp_video_size(request.size);
    let plan = watch_plan(&session.sequence, &config.watch_timing());
    let frames = rasterize_plan(&plan, request.player_turn, size);

    let command =
        encoder_service::encoder_command(config.ffmpeg_path(), request.codec, size, config.frame_rate());
    let process = EncoderProcess::launch(command).map_err(ServiceError::Encoder)?;

    info!(
        player_id,
        level = session.level,
        frames = frames.len(),
        size,
        codec = ?request.codec,
        "streaming watch-phase video"
    );

    Ok(Body::from_stream(encoder_service::stream(process, frames)))
}

/// Expand the frame plan into raw images, rasterizing each distinct frame
/// only once and repeating it by reference.
fn rasterize_plan(plan: &[FrameDescriptor], player_turn: bool, size: u32) -> Vec<Arc<Vec<u8>>> {
    let mut blank: Option<Arc<Vec<u8>>> = None;
    let mut lit: HashMap<Pad, Arc<Vec<u8>>> = HashMap::new();

    plan.iter()
        .map(|descriptor| match descriptor.lit {
            None => Arc::clone(
                blank.get_or_insert_with(|| Arc::new(render_frame(descriptor, player_turn, size))),
            ),
            Some(pad) => Arc::clone(
                lit.entry(pad)
                    .or_insert_with(|| Arc::new(render_frame(descriptor, player_turn, size))),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, render::frames::WatchTiming, state::AppState};

    #[tokio::test]
    async fn no_session_is_rejected_before_any_subprocess_is_spawned() {
        let state = AppState::new(AppConfig::default());
        let request = VideoRequest {
            size: None,
            codec: Codec::default(),
            player_turn: true,
        };

        let result = sequence_stream(&state, 5, request).await;
        assert!(matches!(result, Err(ServiceError::NoActiveSession)));
    }

    #[test]
    fn plan_expansion_shares_identical_frames() {
        let timing = WatchTiming {
            frame_rate: 10,
            initial_delay_ms: 1000,
            lit_ms: 400,
            off_ms: 200,
        };
        let plan = watch_plan(&[Pad::Green, Pad::Green], &timing);
        let frames = rasterize_plan(&plan, true, 200);

        assert_eq!(frames.len(), 22);
        // All blank frames alias one buffer, all lit frames another.
        assert!(Arc::ptr_eq(&frames[0], &frames[9]));
        assert!(Arc::ptr_eq(&frames[10], &frames[16]));
        assert!(!Arc::ptr_eq(&frames[0], &frames[10]));
    }
}
