//! AI assistant endpoints used by the CMS editing console
//!
//! All errors are JSON `{ "error": "<message>" }`.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::middleware::{cache_control_private, ApiError, AppState};
use crate::models::PortableTextBlock;
use crate::services::ai::{
    first_seo_option, prompt_from_source, reading_time_from_blocks, PromptFields, PromptSource,
};
use crate::services::portable_text::extract_plain_text;
use crate::services::{markdown_to_blocks, AiAction, AiRequest, ImageRequest};

const PROXY_MAX_AGE: u32 = 3600;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|e| {
        tracing::debug!("Rejected AI request body: {}", e);
        ApiError::validation_error("Invalid JSON body")
    })
}

/// POST /api/ai
pub async fn generate_text(
    State(state): State<AppState>,
    payload: Result<Json<AiRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    let result = state.ai.generate_text(&request).await?;
    // The console pre-fills the SEO title with the first numbered option
    if AiAction::parse(&request.action) == Some(AiAction::SeoTitle) {
        return Ok(Json(json!({
            "result": result,
            "suggestion": first_seo_option(&result),
        })));
    }
    Ok(Json(json!({ "result": result })))
}

/// POST /api/ai/image
pub async fn generate_images(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    let images = state.ai.generate_images(&request).await?;
    Ok(Json(json!({ "images": images })))
}

#[derive(Debug, Deserialize)]
pub struct ImagePromptRequest {
    pub source: PromptSource,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: Vec<PortableTextBlock>,
    #[serde(default)]
    pub custom: String,
}

/// POST /api/ai/image/prompt: image subject from one of the document fields
pub async fn image_prompt(
    payload: Result<Json<ImagePromptRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    let body_text = extract_plain_text(&request.body);
    let fields = PromptFields {
        title: &request.title,
        description: &request.description,
        excerpt: &request.excerpt,
        body_text: &body_text,
        custom: &request.custom,
    };
    let prompt = prompt_from_source(request.source, &fields);
    if prompt.trim().is_empty() {
        return Err(ApiError::validation_error("A prompt is required"));
    }
    Ok(Json(json!({ "prompt": prompt })))
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// GET /api/ai/image/proxy?url=
pub async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ApiError> {
    let image = state.image_proxy.fetch(query.url.as_deref()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CONTENT_LENGTH, image.bytes.len().to_string()),
            (header::CACHE_CONTROL, cache_control_private(PROXY_MAX_AGE)),
        ],
        image.bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct BlocksRequest {
    #[serde(default)]
    pub markdown: String,
}

/// POST /api/ai/blocks: convert generated markdown into Portable Text
pub async fn markdown_blocks(
    payload: Result<Json<BlocksRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    if request.markdown.trim().is_empty() {
        return Err(ApiError::validation_error("Markdown content is required"));
    }
    Ok(Json(json!({ "blocks": markdown_to_blocks(&request.markdown) })))
}

#[derive(Debug, Deserialize)]
pub struct ReadingTimeRequest {
    #[serde(default)]
    pub body: Vec<PortableTextBlock>,
}

/// POST /api/ai/reading-time: estimate from the body without calling the model
pub async fn reading_time(
    payload: Result<Json<ReadingTimeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    let minutes = reading_time_from_blocks(&request.body)
        .ok_or_else(|| ApiError::validation_error("Body content is required for this action"))?;
    Ok(Json(json!({ "minutes": minutes })))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{sample_state_with, server};
    use crate::services::ai::testing::FakeProvider;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_generate_text_returns_result() {
        let server = server(sample_state_with(FakeProvider::replying("Un resumen breve.")));

        let response = server
            .post("/api/ai")
            .json(&json!({ "action": "summary", "title": "Respirar", "body": "Inhala y exhala." }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "result": "Un resumen breve." }));
    }

    #[tokio::test]
    async fn test_generate_text_validation_errors() {
        let server = server(sample_state_with(FakeProvider::replying("x")));

        let response = server.post("/api/ai").json(&json!({ "action": "poem", "body": "x" })).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"],
            "Invalid action. Must be one of: summary, excerpt, seoTitle, readingTime, bodyContent"
        );

        let response = server.post("/api/ai").json(&json!({ "action": "seoTitle" })).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Title is required for this action");
    }

    #[tokio::test]
    async fn test_generate_text_missing_key_is_503() {
        let provider = FakeProvider {
            not_configured: true,
            ..FakeProvider::default()
        };
        let server = server(sample_state_with(provider));

        let response = server
            .post("/api/ai")
            .json(&json!({ "action": "excerpt", "body": "Texto" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<Value>()["error"], "OPENAI_API_KEY is not configured");
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_400() {
        let server = server(sample_state_with(FakeProvider::replying("x")));
        let response = server.post("/api/ai").text("not json").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_images_keeps_successes() {
        let provider = FakeProvider {
            failing_images: vec![0],
            ..FakeProvider::default()
        };
        let server = server(sample_state_with(provider));

        let response = server
            .post("/api/ai/image")
            .json(&json!({ "prompt": "Un bosque en calma", "count": 3 }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        let images = body["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert!(images[0]["revisedPrompt"].as_str().unwrap().contains("Un bosque en calma"));
    }

    #[tokio::test]
    async fn test_generate_images_all_failed_is_500() {
        let provider = FakeProvider {
            failing_images: vec![0, 1],
            ..FakeProvider::default()
        };
        let server = server(sample_state_with(provider));

        let response = server.post("/api/ai/image").json(&json!({ "prompt": "Luz" })).await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .starts_with("DALL-E API error (500)"));
    }

    #[tokio::test]
    async fn test_generate_images_count_out_of_range() {
        let server = server(sample_state_with(FakeProvider::default()));
        let response = server
            .post("/api/ai/image")
            .json(&json!({ "prompt": "Luz", "count": 9 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Count must be between 1 and 4");
    }

    #[tokio::test]
    async fn test_proxy_rejects_foreign_hosts() {
        let server = server(sample_state_with(FakeProvider::default()));

        let missing = server.get("/api/ai/image/proxy").await;
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.json::<Value>()["error"], "Missing url parameter");

        let foreign = server
            .get("/api/ai/image/proxy")
            .add_query_param("url", "https://example.com/a.png")
            .await;
        assert_eq!(foreign.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(foreign.json::<Value>()["error"], "URL not allowed");
    }

    #[tokio::test]
    async fn test_markdown_blocks() {
        let server = server(sample_state_with(FakeProvider::default()));

        let response = server
            .post("/api/ai/blocks")
            .json(&json!({ "markdown": "## Título\n\nTexto con **fuerza**." }))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        let blocks = body["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["style"], "h2");

        let empty = server.post("/api/ai/blocks").json(&json!({ "markdown": "  " })).await;
        assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reading_time() {
        let server = server(sample_state_with(FakeProvider::default()));
        let text = "palabra ".repeat(450);

        let response = server
            .post("/api/ai/reading-time")
            .json(&json!({ "body": [{
                "_type": "block",
                "_key": "k1",
                "style": "normal",
                "markDefs": [],
                "children": [{ "_type": "span", "_key": "s1", "text": text, "marks": [] }]
            }] }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "minutes": 3 }));

        let empty = server.post("/api/ai/reading-time").json(&json!({ "body": [] })).await;
        assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(empty.json::<Value>()["error"], "Body content is required for this action");
    }

    #[tokio::test]
    async fn test_seo_title_includes_first_option() {
        let reply = "1. Respira hondo: guía práctica\n2. El arte de respirar\n3. Calma en cinco minutos";
        let server = server(sample_state_with(FakeProvider::replying(reply)));

        let response = server
            .post("/api/ai")
            .json(&json!({ "action": "seoTitle", "title": "Respiración" }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["result"], reply);
        assert_eq!(body["suggestion"], "Respira hondo: guía práctica");
    }

    #[tokio::test]
    async fn test_image_prompt_from_source() {
        let server = server(sample_state_with(FakeProvider::default()));

        let response = server
            .post("/api/ai/image/prompt")
            .json(&json!({ "source": "title", "title": "Bosque al amanecer", "custom": "otro" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "prompt": "Bosque al amanecer" }));

        let text = "a".repeat(600);
        let response = server
            .post("/api/ai/image/prompt")
            .json(&json!({ "source": "body", "body": [{
                "_type": "block",
                "_key": "k1",
                "style": "normal",
                "markDefs": [],
                "children": [{ "_type": "span", "_key": "s1", "text": text, "marks": [] }]
            }] }))
            .await;
        response.assert_status_ok();
        let prompt = response.json::<Value>()["prompt"].as_str().unwrap().to_string();
        assert_eq!(prompt.chars().count(), 500);
    }

    #[tokio::test]
    async fn test_image_prompt_requires_content() {
        let server = server(sample_state_with(FakeProvider::default()));

        let empty = server
            .post("/api/ai/image/prompt")
            .json(&json!({ "source": "excerpt", "title": "Yoga" }))
            .await;
        assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(empty.json::<Value>()["error"], "A prompt is required");

        let unknown = server
            .post("/api/ai/image/prompt")
            .json(&json!({ "source": "tags" }))
            .await;
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(unknown.json::<Value>()["error"], "Invalid JSON body");
    }
}
