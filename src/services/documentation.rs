use utoipa::OpenApi;

/// OpenAPI document of the HTTP surface: the health probe and the bridge
/// gateway, with the frame schemas the bridge exchanges over it.
#[derive(OpenApi)]
#[openapi(
    info(title = "Jukebox Back"),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::gateway::gateway_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthStatus,
            crate::dto::health::HealthResponse,
            crate::dto::gateway::GatewayInbound,
            crate::dto::gateway::GatewayOutbound,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "gateway", description = "WebSocket link to the chat and voice bridge"),
    )
)]
pub struct ApiDoc;
