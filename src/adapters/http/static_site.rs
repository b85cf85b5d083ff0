use axum::{
    http::{header, HeaderValue},
    Router,
};
use std::path::Path;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

/// Página que se anuncia al arrancar el servidor estático.
pub const DEFAULT_PAGE: &str = "web-simple.html";

/// Sirve `root` tal cual, con cabeceras que desactivan toda caché del
/// navegador: cada recarga trae la última versión de la página.
pub fn static_router(root: impl AsRef<Path>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root.as_ref()))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
}
