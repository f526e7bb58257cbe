/// OpenAPI documentation generation.
pub mod documentation;
/// External encoder subprocess bridge.
pub mod encoder_service;
/// Core game progression logic.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Per-player countdown management.
pub mod timer_service;
/// Watch-phase video assembly and streaming.
pub mod video_service;
