//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type returned by the AI endpoints
//! - Security and cache headers

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    AiError, AiService, ContentService, ImageProxy, ImageUrlBuilder, PortableTextRenderer, ProxyError,
    SchemaBuilder, SiteUrls,
};
use crate::theme::ThemeEngine;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub content: Arc<ContentService>,
    pub ai: Arc<AiService>,
    pub image_proxy: Arc<ImageProxy>,
    pub theme: Arc<ThemeEngine>,
    pub renderer: Arc<PortableTextRenderer>,
    pub images: ImageUrlBuilder,
    pub urls: SiteUrls,
    pub schemas: Arc<SchemaBuilder>,
}

impl AppState {
    /// Assemble the state from configuration and the three backing services
    pub fn new(
        config: Config,
        content: ContentService,
        ai: AiService,
        image_proxy: ImageProxy,
        theme: ThemeEngine,
    ) -> Self {
        let images = ImageUrlBuilder::from_config(&config.cms);
        let urls = SiteUrls::new(config.site.url.clone());
        let schemas = SchemaBuilder::new(config.site.name.clone(), urls.clone());
        Self {
            renderer: Arc::new(PortableTextRenderer::new(images.clone())),
            images,
            urls,
            schemas: Arc::new(schemas),
            config: Arc::new(config),
            content: Arc::new(content),
            ai: Arc::new(ai),
            image_proxy: Arc::new(image_proxy),
            theme: Arc::new(theme),
        }
    }
}

/// Error response for API errors (`{ "error": "<message>" }`)
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: message.into(),
        }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        let status = match &err {
            AiError::Validation(_) => StatusCode::BAD_REQUEST,
            AiError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("AI request failed: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        let status = match &err {
            ProxyError::MissingUrl | ProxyError::InvalidUrl => StatusCode::BAD_REQUEST,
            ProxyError::NotAllowed => StatusCode::FORBIDDEN,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Request(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Image proxy failed: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

/// Add the security headers to every response
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for &(name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}

// ============================================================================
// Cache Control Headers
// ============================================================================

/// Cache-Control for static assets
pub fn cache_control_static(max_age: u32, immutable: bool) -> String {
    if immutable {
        format!("public, max-age={}, immutable", max_age)
    } else {
        format!("public, max-age={}", max_age)
    }
}

/// Cache-Control for rendered pages, revalidated in the background once stale
pub fn cache_control_page(max_age: u64) -> String {
    format!("public, max-age={}, stale-while-revalidate", max_age)
}

/// Cache-Control for responses that only the requesting browser may keep
pub fn cache_control_private(max_age: u32) -> String {
    format!("private, max-age={}", max_age)
}

/// Header pair for a Cache-Control value
pub fn cache_header(value: String) -> (header::HeaderName, String) {
    (header::CACHE_CONTROL, value)
}
