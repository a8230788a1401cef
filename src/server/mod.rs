//! HTTP surface: the chat page and its JSON API.
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | GET | `/` | chat page |
//! | GET | `/health` | liveness, provider and candidate list |
//! | POST | `/api/sessions` | new session |
//! | GET / DELETE | `/api/sessions/{id}` | snapshot / end session |
//! | POST | `/api/sessions/{id}/messages` | one chat turn |
//! | POST | `/api/sessions/{id}/pdf` | multipart PDF upload |
//! | POST | `/api/sessions/{id}/data` | multipart CSV/XLSX upload |
//! | POST | `/api/sessions/{id}/clear` | clear chat |
//! | DELETE | `/api/sessions/{id}/files` | remove files |

pub mod error;
pub mod handlers;
pub mod page;
pub mod routes;
pub mod state;

pub use error::ErrorResponse;
pub use routes::create_router;
pub use state::AppState;

use crate::chat::ChatEngine;
use crate::config::ServerConfig;
use crate::error::ChatError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Serve the chat UI until Ctrl+C or SIGTERM.
pub async fn serve(engine: ChatEngine, server: ServerConfig) -> Result<(), ChatError> {
    let addr: SocketAddr = server
        .bind_addr()
        .parse()
        .map_err(|e| ChatError::InvalidConfig(format!("Invalid address: {e}")))?;

    let state = Arc::new(AppState::new(engine, server));
    let router = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ChatError::Server(format!("Failed to bind to {addr}: {e}")))?;

    info!(%addr, "Chat server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ChatError::Server(e.to_string()))?;

    info!("Chat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
