// File: crates/services/calrelay_backend/src/app.rs
use axum::Router;
use calrelay_calcom::routes::{routes as calcom_routes, PAID_BOOKING_PATH};
use calrelay_common::{config_error, RelayError};
use calrelay_config::AppConfig;
use calrelay_x402::with_payment_gate;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::service_factory::RelayServices;

/// Composes the full HTTP application: health, Cal.com routes, the payment
/// gate, optional static frontend and Swagger UI, CORS and access logs.
pub fn build_app(config: Arc<AppConfig>, services: RelayServices) -> Result<Router, RelayError> {
    let mut app = calrelay_common::routes()
        .merge(calcom_routes(config.clone(), services.provider)?);

    if config.use_x402 && config.x402.is_some() {
        let facilitator = services
            .facilitator
            .ok_or_else(|| config_error("x402 is enabled but no facilitator was created"))?;
        app = with_payment_gate(app, &config, facilitator, &[PAID_BOOKING_PATH])?;
    }

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use calrelay_calcom::doc::CalComApiDoc;
        use calrelay_x402::doc::X402ApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "calrelay API",
                version = "0.1.0",
                description = "Cal.com availability and booking relay with x402 payments",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            paths(calrelay_common::handlers::health_handler),
            components(schemas(calrelay_common::handlers::HealthResponse)),
            tags((name = "Health", description = "Liveness"))
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(CalComApiDoc::openapi());
        openapi_doc.merge(X402ApiDoc::openapi());
        info!("📖 Adding Swagger UI at /docs");

        app = app.merge(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi_doc));
    }

    if let Some(dir) = config.server.static_dir.as_deref() {
        info!("Serving static files from {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    Ok(app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()))
}
