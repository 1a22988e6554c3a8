use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    http::{HeaderMap, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{error::AppError, services::gateway_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/gateway",
    tag = "gateway",
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 401, description = "Missing or wrong bridge token", body = crate::error::ErrorBody),
        (status = 409, description = "Another bridge is connected", body = crate::error::ErrorBody),
    )
)]
/// Upgrade the HTTP connection into the bridge WebSocket link.
pub async fn gateway_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let config = state.config();
    authorize(config.gateway_token(), &headers)?;
    if state.gateway().is_connected().await {
        return Err(AppError::Conflict("a bridge is already connected".into()));
    }

    let shared_state = state.clone();
    Ok(ws
        .on_upgrade(move |socket| gateway_service::handle_socket(shared_state, socket))
        .into_response())
}

/// Check the bearer token when one is configured.
fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(AppError::Unauthorized("invalid bridge token".into())),
        None => Err(AppError::Unauthorized("missing bridge token".into())),
    }
}

/// Configure the bridge WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/gateway", get(gateway_handler))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn token_is_optional_until_configured() {
        assert!(authorize(None, &HeaderMap::new()).is_ok());
        assert!(authorize(Some("s3cret"), &bearer("s3cret")).is_ok());
        assert!(matches!(
            authorize(Some("s3cret"), &bearer("guess")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(Some("s3cret"), &HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
    }
}
