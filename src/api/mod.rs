//! API layer - HTTP handlers and routing
//!
//! This module contains every HTTP endpoint of the site:
//! - Server-rendered pages (home, sections, articles, profiles, tags, about)
//! - AI assistant endpoints for the CMS editing console
//! - The image download proxy
//! - sitemap.xml, robots.txt and embedded static assets

pub mod ai;
pub mod middleware;
pub mod pages;
pub mod seo_files;
pub mod static_files;
pub mod views;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the editing console API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/ai", post(ai::generate_text))
        .route("/ai/image", post(ai::generate_images))
        .route("/ai/image/prompt", post(ai::image_prompt))
        .route("/ai/image/proxy", get(ai::proxy_image))
        .route("/ai/blocks", post(ai::markdown_blocks))
        .route("/ai/reading-time", post(ai::reading_time))
}

/// Build the site page router
pub fn build_site_router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/secciones", get(pages::sections))
        .route("/perfiles", get(pages::profiles))
        .route("/perfiles/{slug}", get(pages::profile))
        .route("/sobre-nosotros", get(pages::about))
        .route("/tags/{slug}", get(pages::tag))
        .route("/blog", get(pages::legacy_redirect))
        .route("/blog/{*rest}", get(pages::legacy_redirect))
        .route("/categorias", get(pages::legacy_redirect))
        .route("/categorias/{*rest}", get(pages::legacy_redirect))
        .route("/sitemap.xml", get(seo_files::sitemap))
        .route("/robots.txt", get(seo_files::robots))
        .route("/static/{*path}", get(static_files::serve_static))
        .route("/{section}", get(pages::section))
        .route("/{section}/{slug}", get(pages::section_entry))
        .route("/{section}/{subcategory}/{post}", get(pages::subcategory_post))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Invalid CORS origin {:?}, cross-origin requests are disabled", cors_origin),
    }

    Router::new()
        .nest("/api", build_api_router())
        .merge(build_site_router())
        .fallback(pages::not_found)
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::{sample_state, server};
    use axum::http::{header, HeaderValue, StatusCode};

    #[tokio::test]
    async fn test_pages_carry_security_headers() {
        let server = server(sample_state());
        let response = server.get("/secciones").await;

        response.assert_status_ok();
        assert_eq!(response.header("x-frame-options"), "DENY");
        assert_eq!(response.header("x-content-type-options"), "nosniff");
    }

    #[tokio::test]
    async fn test_static_stylesheet_served() {
        let server = server(sample_state());
        let response = server.get("/static/site.css").await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "text/css; charset=utf-8");

        let missing = server.get("/static/nope.js").await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_console_origin() {
        let server = server(sample_state());
        let response = server
            .method(axum::http::Method::OPTIONS, "/api/ai")
            .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:3333"))
            .add_header(header::ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("POST"))
            .await;

        assert_eq!(
            response.header("access-control-allow-origin"),
            "http://localhost:3333"
        );
    }
}
