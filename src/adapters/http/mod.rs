pub mod error;
pub mod routes;
pub mod state;
pub mod static_site;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::adapters::http::state::HttpState;

/// Rutas del servicio de detección. CORS abierto: el front-end web lo llama
/// desde otro origen.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/detect", post(routes::detect))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Abre el listener; un puerto ocupado se reporta con una pista en vez del
/// error crudo del sistema operativo.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            let port = addr.rsplit(':').next().unwrap_or(addr);
            Err(e).with_context(|| {
                format!("port {port} is already in use; free it with `lsof -ti:{port} | xargs kill` and retry")
            })
        }
        Err(e) => Err(e).with_context(|| format!("cannot bind {addr}")),
    }
}
