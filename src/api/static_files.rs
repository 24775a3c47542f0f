//! Embedded static assets (`/static/*`)

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use crate::api::middleware::cache_control_static;

/// Stylesheet, icons and other site assets
#[derive(RustEmbed)]
#[folder = "static/"]
struct SiteAssets;

const ASSET_MAX_AGE: u32 = 3600;

/// Serve an embedded asset
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let decoded = urlencoding::decode(&path)
        .map(|p| p.into_owned())
        .unwrap_or(path);
    let asset_path = decoded.trim_start_matches('/');

    match SiteAssets::get(asset_path) {
        Some(content) => build_response(asset_path, content.data.into_owned()),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, get_content_type(path).to_string()),
            (header::CACHE_CONTROL, cache_control_static(ASSET_MAX_AGE, false)),
        ],
        data,
    )
        .into_response()
}

fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_content_type() {
        assert_eq!(get_content_type("site.css"), "text/css; charset=utf-8");
        assert_eq!(get_content_type("logo.svg"), "image/svg+xml");
        assert_eq!(get_content_type("favicon.ico"), "image/x-icon");
        assert_eq!(get_content_type("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_stylesheet_is_embedded() {
        assert!(SiteAssets::get("site.css").is_some());
    }
}
