// File: crates/services/calrelay_backend/src/main.rs
use calrelay_backend::{build_app, RelayServices};
use calrelay_common::logging;
use calrelay_config::{ensure_dotenv_loaded, load_config};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_path = ensure_dotenv_loaded();
    logging::init();
    info!("Environment loaded from {}", dotenv_path);

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("🚨 Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let app = match RelayServices::from_config(&config)
        .and_then(|services| build_app(config.clone(), services))
    {
        Ok(app) => app,
        Err(e) => {
            error!("🚨 Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("🚨 Cannot bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Starting server at http://{}", addr);

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("🚨 Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
