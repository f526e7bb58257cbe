use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Chroma Recall Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::start_game,
        crate::routes::game::advance_timer,
        crate::routes::game::submit_move,
        crate::routes::game::abandon,
        crate::routes::video::sequence_video,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::StartGameRequest,
            crate::dto::game::StartGameResponse,
            crate::dto::game::AdvanceTimerResponse,
            crate::dto::game::SubmitMoveRequest,
            crate::dto::game::SubmitMoveResponse,
            crate::dto::game::GameOverResponse,
            crate::state::session::Pad,
            crate::services::encoder_service::Codec,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Live game session operations"),
        (name = "video", description = "Watch-phase video streaming"),
    )
)]
pub struct ApiDoc;
