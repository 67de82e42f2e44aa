//! HTTP API server for the chunk database.

pub mod routes;

use crate::index::IndexKind;
use crate::service::ChunkDb;
use std::sync::Arc;

/// Shared application state for the HTTP server.
pub struct AppState {
    pub db: ChunkDb,
}

/// Start the HTTP server with libraries backed by the given index kind.
pub async fn start(addr: &str, index_kind: IndexKind) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        db: ChunkDb::new(index_kind),
    });

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
