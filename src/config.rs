//! Application-level configuration loading, including the game timing constants.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::render::frames::WatchTiming;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CHROMA_RECALL_BACK_CONFIG_PATH";
/// Environment variable that overrides the encoder binary path.
const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

const DEFAULT_ROUND_SECONDS: u64 = 1;
const DEFAULT_TICK_MILLIS: u64 = 1000;
const DEFAULT_FRAME_RATE: u32 = 10;
const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
const DEFAULT_LIT_MS: u64 = 400;
const DEFAULT_OFF_MS: u64 = 200;
const DEFAULT_VIDEO_SIZE: u32 = 300;
const MIN_VIDEO_SIZE: u32 = 200;
const MAX_VIDEO_SIZE: u32 = 1024;
const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Seconds of answer time granted per level; the countdown is armed with
    /// `level * round_seconds` ticks.
    pub(crate) round_seconds: u64,
    /// Wall-clock period of one countdown tick.
    pub(crate) tick: Duration,
    /// Frame rate of the watch-phase video.
    pub(crate) frame_rate: u32,
    /// Blank lead-in before the first pad lights up.
    pub(crate) initial_delay_ms: u64,
    /// How long each pad stays lit.
    pub(crate) lit_ms: u64,
    /// Blank gap between two lit pads.
    pub(crate) off_ms: u64,
    /// Square video edge used when the client does not ask for a size.
    pub(crate) default_video_size: u32,
    /// Path of the external encoder binary.
    pub(crate) ffmpeg_path: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded game configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(ffmpeg) = env::var_os(FFMPEG_PATH_ENV)
            .map(|value| value.to_string_lossy().into_owned())
            .filter(|value| !value.is_empty())
        {
            config.ffmpeg_path = ffmpeg;
        }

        config
    }

    /// Countdown ticks granted for the given level.
    pub fn ticks_for_level(&self, level: u32) -> i64 {
        (u64::from(level) * self.round_seconds) as i64
    }

    /// Wall-clock period of one countdown tick.
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Watch-phase timing constants bundled for the frame planner.
    pub fn watch_timing(&self) -> WatchTiming {
        WatchTiming {
            frame_rate: self.frame_rate,
            initial_delay_ms: self.initial_delay_ms,
            lit_ms: self.lit_ms,
            off_ms: self.off_ms,
        }
    }

    /// Frame rate of the watch-phase video.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Path of the external encoder binary.
    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    /// Clamp a client-requested video edge to the supported bounds.
    pub fn clamp_video_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_video_size)
            .clamp(MIN_VIDEO_SIZE, MAX_VIDEO_SIZE)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            round_seconds: DEFAULT_ROUND_SECONDS,
            tick: Duration::from_millis(DEFAULT_TICK_MILLIS),
            frame_rate: DEFAULT_FRAME_RATE,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            lit_ms: DEFAULT_LIT_MS,
            off_ms: DEFAULT_OFF_MS,
            default_video_size: DEFAULT_VIDEO_SIZE,
            ffmpeg_path: DEFAULT_FFMPEG_PATH.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    round_seconds: Option<u64>,
    tick_millis: Option<u64>,
    frame_rate: Option<u32>,
    initial_delay_ms: Option<u64>,
    lit_ms: Option<u64>,
    off_ms: Option<u64>,
    default_video_size: Option<u32>,
    ffmpeg_path: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            round_seconds: raw.round_seconds.unwrap_or(defaults.round_seconds),
            tick: raw
                .tick_millis
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick),
            frame_rate: raw.frame_rate.unwrap_or(defaults.frame_rate),
            initial_delay_ms: raw.initial_delay_ms.unwrap_or(defaults.initial_delay_ms),
            lit_ms: raw.lit_ms.unwrap_or(defaults.lit_ms),
            off_ms: raw.off_ms.unwrap_or(defaults.off_ms),
            default_video_size: raw.default_video_size.unwrap_or(defaults.default_video_size),
            ffmpeg_path: raw.ffmpeg_path.unwrap_or(defaults.ffmpeg_path),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_game_constants() {
        let config = AppConfig::default();
        assert_eq!(config.frame_rate(), 10);
        assert_eq!(config.ticks_for_level(1), 1);
        assert_eq!(config.ticks_for_level(4), 4);
        assert_eq!(config.tick(), Duration::from_secs(1));
    }

    #[test]
    fn video_size_is_clamped_to_bounds() {
        let config = AppConfig::default();
        assert_eq!(config.clamp_video_size(None), 300);
        assert_eq!(config.clamp_video_size(Some(50)), 200);
        assert_eq!(config.clamp_video_size(Some(4000)), 1024);
        assert_eq!(config.clamp_video_size(Some(512)), 512);
    }

    #[test]
    fn raw_config_fills_missing_fields_with_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"round_seconds": 2}"#).expect("valid json");
        let config: AppConfig = raw.into();
        assert_eq!(config.ticks_for_level(1), 2);
        assert_eq!(config.frame_rate(), 10);
    }
}
