//! Server-rendered generator pages.
//!
//! | Route            | Page                                   |
//! |------------------|----------------------------------------|
//! | `GET /`          | simple generator (steps 1-4, cooldown) |
//! | `POST /`         | simple generator submission            |
//! | `GET /generate`  | plus generator (steps, image count)    |
//! | `POST /generate` | plus generator submission              |
//! | `GET /health`    | liveness                               |

mod gate;
mod handlers;
mod pages;

pub use gate::{GenerationGate, GenerationPermit, DEFAULT_COOLDOWN};
pub use handlers::{PlusForm, SimpleForm};
pub use pages::{
    escape_html, render_plus, render_simple, PlusPage, SimplePage, PLUS_FAILURE_MESSAGE,
};

use crate::error::Result;
use crate::image::ImageProvider;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Shared state for the page handlers.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn ImageProvider>,
    gate: Arc<GenerationGate>,
}

impl AppState {
    /// Creates state around a provider with the default 8-second cooldown.
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self::with_cooldown(provider, DEFAULT_COOLDOWN)
    }

    /// Creates state with a custom simple-page cooldown.
    pub fn with_cooldown(provider: Arc<dyn ImageProvider>, cooldown: Duration) -> Self {
        Self {
            provider,
            gate: Arc::new(GenerationGate::new(cooldown)),
        }
    }

    /// Returns the admission gate.
    pub fn gate(&self) -> &GenerationGate {
        &self.gate
    }
}

/// Builds the router for both pages.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::simple_page).post(handlers::simple_submit))
        .route("/generate", get(handlers::plus_page).post(handlers::plus_submit))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the pages on `addr` until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    tracing::info!(provider = state.provider.name(), "starting web server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
