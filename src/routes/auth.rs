use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;

/// Fallback header for clients that cannot set an authorization header.
const PLAYER_ID_HEADER: &str = "x-player-id";

/// Player identity resolved from the request.
///
/// The chat-app host authenticates players and mints the bearer tokens; that
/// exchange lives outside this engine, so the extractor only resolves the
/// numeric player id the host placed in `Authorization: Bearer <id>` (or the
/// `x-player-id` header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerIdentity(pub i64);

impl<S> FromRequestParts<S> for PlayerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let fallback = parts
            .headers
            .get(PLAYER_ID_HEADER)
            .and_then(|value| value.to_str().ok());

        bearer
            .or(fallback)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(PlayerIdentity)
            .ok_or_else(|| AppError::Unauthorized("player identity required".into()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(request: Request<()>) -> Result<PlayerIdentity, AppError> {
        let (mut parts, ()) = request.into_parts();
        PlayerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn resolves_bearer_identity() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer 180085203")
            .body(())
            .expect("request");
        assert_eq!(extract(request).await.ok(), Some(PlayerIdentity(180085203)));
    }

    #[tokio::test]
    async fn falls_back_to_the_player_id_header() {
        let request = Request::builder()
            .header(PLAYER_ID_HEADER, "42")
            .body(())
            .expect("request");
        assert_eq!(extract(request).await.ok(), Some(PlayerIdentity(42)));
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed_identities() {
        let missing = Request::builder().body(()).expect("request");
        assert!(extract(missing).await.is_err());

        let malformed = Request::builder()
            .header(header::AUTHORIZATION, "Bearer not-a-number")
            .body(())
            .expect("request");
        assert!(extract(malformed).await.is_err());
    }
}
