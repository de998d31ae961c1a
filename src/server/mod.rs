//! HTTP API with Tower middleware.

pub mod error;
pub mod extract;
pub mod routes;


use crate::app::AppContext;
use crate::utils::error::{ConsultError, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any)
}

pub fn create_app(ctx: Arc<AppContext>) -> Router {
    let cors_origin = ctx.config.server.cors_origin.clone();
    let app = Router::new().nest("/api", routes::create_router().with_state(ctx));

    let app = match cors_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::info!("Allowing cross-origin requests from {}", origin);
                app.layer(cors_layer(value))
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                app
            }
        },
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
}

/// Resolves `host` (an IP address or a name such as `localhost`) to a bind address.
pub async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let invalid = |reason: String| ConsultError::InvalidConfigValueError {
        field: "server.host".to_string(),
        value: host.to_string(),
        reason,
    };
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| invalid(format!("Cannot resolve host: {}", e)))?
        .next()
        .ok_or_else(|| invalid("Host resolved to no addresses".to_string()))
}

pub async fn run_server(ctx: Arc<AppContext>, addr: SocketAddr) -> Result<()> {
    let app = create_app(ctx);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Consultation desk listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
