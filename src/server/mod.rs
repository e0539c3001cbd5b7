//! # HTTP Server for ePOS-Print Clients
//!
//! Exposes the endpoint Epson's ePOS-Print SDKs post to, so web POS
//! front-ends can print to any ESC/POS printer this host can reach.
//!
//! ## Usage
//!
//! ```bash
//! posproxy serve --listen 0.0.0.0:8000 --device /dev/usb/lp0
//! ```
//!
//! Clients then point their ePOS-Print URL at
//! `http://<host>:8000/cgi-bin/epos/service.cgi`.
//!
//! ## Routes
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | POST | `/cgi-bin/epos/service.cgi` | Print one SOAP job |
//! | OPTIONS | `/cgi-bin/epos/service.cgi` | CORS preflight |
//!
//! Browsers call from arbitrary origins, so the request `Origin` is
//! mirrored back.

mod handlers;
mod state;

pub use state::{AppState, DEFAULT_TIMEOUT, ServerConfig};

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, header},
    routing::post,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ProxyError;

/// Path ePOS-Print clients post to.
pub const EPOS_PATH: &str = "/cgi-bin/epos/service.cgi";

/// Largest accepted request body (base64 images make jobs big).
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Build the router around an existing state.
///
/// Split out from [`serve`] so tests can drive it with `oneshot`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("soapaction")]);

    Router::new()
        .route(EPOS_PATH, post(handlers::epos::print))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use posproxy::job::JobOptions;
/// use posproxy::server::{serve, ServerConfig, DEFAULT_TIMEOUT};
///
/// # async fn example() -> Result<(), posproxy::error::ProxyError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8000".to_string(),
///     device: "/dev/usb/lp0".parse().unwrap(),
///     write_timeout: DEFAULT_TIMEOUT,
///     job: JobOptions::default(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), ProxyError> {
    let state = Arc::new(AppState::open(&config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            ProxyError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(
        listen = %config.listen_addr,
        device = %config.device,
        printer = config.job.printer.name,
        width = config.job.printer.width_dots,
        dithering = %config.job.dithering,
        "posproxy listening on http://{}{}",
        config.listen_addr,
        EPOS_PATH
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| ProxyError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
