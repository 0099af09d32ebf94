// --- File: crates/calrelay_common/src/handlers.rs ---
use axum::Json;
use serde::Serialize;

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub message: &'static str,
}

/// Liveness probe. Never touches an upstream service.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Health"
))]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { message: "healthy" })
}
