//! # docfill_server
//!
//! Thin HTTP surface over [`DocumentService`]:
//!
//! | route | response |
//! |---|---|
//! | `GET /` | template list with the request's translation table |
//! | `GET /fill/:tpl` | field schema of one template |
//! | `POST /generate` | the generated document as an attachment |
//! | `GET /set_lang?lang=xx` | sets the language cookie and redirects back |
//! | `GET /health` | liveness |

pub mod config;
pub mod error;
pub mod i18n;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use docfill_core::DocumentService;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use i18n::Translations;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DocumentService>,
    pub translations: Arc<Translations>,
}

impl AppState {
    pub fn new(service: Arc<DocumentService>, translations: Arc<Translations>) -> Self {
        Self {
            service,
            translations,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/fill/:tpl", get(routes::fill))
        .route("/generate", post(routes::generate))
        .route("/set_lang", get(routes::set_lang))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Translation tables named by the configuration, or the built-in ones.
pub fn load_translations(config: &ServerConfig) -> ServerResult<Translations> {
    match &config.translations_path {
        Some(path) => Translations::load(path),
        None => Ok(Translations::builtin()),
    }
}

/// Serve until Ctrl-C.
pub async fn serve(config: ServerConfig, service: Arc<DocumentService>) -> ServerResult<()> {
    let translations = Arc::new(load_translations(&config)?);
    let addr = config.socket_addr()?;
    let app = router(AppState::new(service, translations), &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
