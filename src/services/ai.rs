//! AI writing assistant
//!
//! Backs the editing console's AI helpers: text generation for summaries,
//! excerpts, SEO titles, reading time and full article drafts, and
//! illustration generation. Calls go through an [`AiProvider`] so the
//! OpenAI transport can be swapped out in tests.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AiConfig;
use crate::models::PortableTextBlock;
use crate::services::formatters::reading_minutes;
use crate::services::portable_text::extract_plain_text;

/// Longest body forwarded to the model, in characters
pub const MAX_INPUT_LENGTH: usize = 15_000;
/// Longest image subject forwarded to the model, in characters
pub const MAX_PROMPT_LENGTH: usize = 1_000;
pub const DEFAULT_IMAGE_COUNT: u32 = 2;
pub const MAX_IMAGE_COUNT: u32 = 4;
/// Characters of body text used when an image prompt is built from the body
const BODY_PROMPT_LENGTH: usize = 500;

/// Error types for AI operations
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("OPENAI_API_KEY is not configured")]
    NotConfigured,

    #[error("{0}")]
    Validation(String),

    #[error("OpenAI API error ({status}): {message}")]
    Completion { status: u16, message: String },

    #[error("DALL-E API error ({status}): {message}")]
    Image { status: u16, message: String },

    #[error("{0}")]
    InvalidResponse(String),

    #[error("All image generations failed")]
    AllImagesFailed,

    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

impl AiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Text generation actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    Summary,
    Excerpt,
    SeoTitle,
    ReadingTime,
    BodyContent,
}

impl AiAction {
    pub const ALL: [AiAction; 5] = [
        AiAction::Summary,
        AiAction::Excerpt,
        AiAction::SeoTitle,
        AiAction::ReadingTime,
        AiAction::BodyContent,
    ];

    /// Wire name used by the editing console
    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::Summary => "summary",
            AiAction::Excerpt => "excerpt",
            AiAction::SeoTitle => "seoTitle",
            AiAction::ReadingTime => "readingTime",
            AiAction::BodyContent => "bodyContent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }

    /// Actions that work from the title alone
    pub fn is_title_only(&self) -> bool {
        matches!(self, AiAction::SeoTitle | AiAction::BodyContent)
    }

    pub fn system_prompt(&self) -> String {
        match self {
            AiAction::Summary => SUMMARY_PROMPT.join(" "),
            AiAction::Excerpt => EXCERPT_PROMPT.join(" "),
            AiAction::SeoTitle => SEO_TITLE_PROMPT.join(" "),
            AiAction::ReadingTime => READING_TIME_PROMPT.join(" "),
            AiAction::BodyContent => BODY_CONTENT_PROMPT.join("\n"),
        }
    }

    /// User message for the action; the body is cut to [`MAX_INPUT_LENGTH`] characters
    pub fn user_message(&self, title: &str, body: &str) -> String {
        let body = truncate_chars(body, MAX_INPUT_LENGTH);
        match self {
            AiAction::Summary | AiAction::Excerpt => {
                format!("Título: {}\n\nContenido:\n{}", title, body)
            }
            AiAction::SeoTitle => format!("Título actual: {}", title),
            AiAction::ReadingTime => body.to_string(),
            AiAction::BodyContent => format!("Título del artículo: {}", title),
        }
    }
}

const SUMMARY_PROMPT: &[&str] = &[
    "Eres un asistente editorial para un blog de bienestar, yoga y aromaterapia en español.",
    "Genera un resumen claro y conciso del artículo proporcionado.",
    "El resumen debe tener entre 2 y 4 oraciones.",
    "Usa un tono cálido, natural y profesional.",
    "Responde SOLO con el resumen, sin encabezados ni explicaciones adicionales.",
];

const EXCERPT_PROMPT: &[&str] = &[
    "Eres un asistente editorial para un blog de bienestar en español.",
    "Genera un extracto atractivo del artículo proporcionado.",
    "El extracto debe tener máximo 180 caracteres.",
    "Debe enganchar al lector y resumir la idea principal.",
    "Responde SOLO con el extracto, sin comillas ni explicaciones.",
];

const SEO_TITLE_PROMPT: &[&str] = &[
    "Eres un experto SEO para un blog de bienestar, yoga y aromaterapia en español.",
    "Dado el título actual de un artículo, genera 3 variantes optimizadas para SEO.",
    "Cada variante debe ser atractiva, contener palabras clave relevantes y tener máximo 60 caracteres.",
    "Responde con las 3 opciones numeradas (1. 2. 3.), sin explicaciones.",
];

const READING_TIME_PROMPT: &[&str] = &[
    "Calcula el tiempo de lectura aproximado del siguiente texto.",
    "Usa una velocidad de 200 palabras por minuto.",
    "Responde SOLO con el número entero de minutos, nada más.",
];

const BODY_CONTENT_PROMPT: &[&str] = &[
    "Eres un redactor editorial experto para \"Almas Enraizadas\", un blog premium de bienestar, yoga, aromaterapia, mindfulness y crecimiento personal en español.",
    "",
    "MISIÓN: Escribe un artículo completo, profundo y bien investigado basado en el título proporcionado.",
    "",
    "ESTRUCTURA OBLIGATORIA (1000-1500 palabras):",
    "1. Párrafo de apertura enganchador que conecte emocionalmente con el lector.",
    "2. Entre 4 y 6 secciones con subtítulos ## (H2).",
    "3. Dentro de las secciones, usa subsecciones ### (H3) cuando el tema lo requiera.",
    "4. Un cierre inspirador con llamada a la acción suave.",
    "",
    "FORMATO MARKDOWN QUE DEBES USAR:",
    "- ## para títulos de sección (H2)",
    "- ### para subsecciones (H3)",
    "- **texto** para negritas (conceptos clave, datos importantes)",
    "- *texto* para cursivas (términos en otros idiomas, énfasis sutil, nombres científicos)",
    "- > para citas textuales, frases inspiradoras o reflexiones destacadas (úsalas 2-3 veces)",
    "- Líneas que empiezan con - son listas con viñetas (usa para tips, beneficios, ingredientes)",
    "- Líneas que empiezan con 1. 2. 3. son listas numeradas (usa para pasos o rutinas)",
    "- Separa cada párrafo con una línea en blanco.",
    "- NO uses # (H1), solo ## y ###.",
    "",
    "ELEMENTOS QUE ENRIQUECEN EL ARTÍCULO:",
    "- Incluye al menos una cita inspiradora de un filósofo, maestro espiritual o experto en bienestar entre comillas con > (blockquote).",
    "- Usa datos concretos, porcentajes o referencias a estudios cuando sea posible (ej: \"Según un estudio de la Universidad de Harvard...\").",
    "- Incluye al menos una lista de tips prácticos que el lector pueda aplicar hoy.",
    "- Si el tema lo permite, incluye una mini-rutina o paso a paso con lista numerada.",
    "- Usa **negritas** para destacar los 3-5 conceptos más importantes del artículo.",
    "- Usa *cursivas* para nombres en sánscrito, latín o inglés, y para énfasis emocional.",
    "",
    "TONO Y VOZ:",
    "- Cálido, cercano pero profesional. Como hablar con un amigo que sabe del tema.",
    "- Empoderador: el lector debe sentirse capaz de aplicar lo aprendido.",
    "- Sensorial: usa descripciones que evoquen aromas, texturas, sensaciones.",
    "- Inclusivo: habla en segunda persona (tú) o primera persona plural (nosotros).",
    "",
    "Responde SOLO con el artículo. Sin comentarios meta, sin \"aquí tienes\", sin explicaciones.",
];

const IMAGE_STYLE_PROMPT: &[&str] = &[
    "Create a beautiful, serene illustration for a wellness and yoga blog.",
    "Style: soft watercolor or pastel digital art, warm natural tones (sage green, beige, soft mauve).",
    "The image should feel calming, modern, and professional.",
    "No text, no logos, no watermarks.",
];

/// Text generation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl AiRequest {
    /// Check the request and resolve its action
    pub fn validate(&self) -> Result<AiAction, AiError> {
        let action = AiAction::parse(&self.action).ok_or_else(|| {
            let names: Vec<&str> = AiAction::ALL.iter().map(|a| a.as_str()).collect();
            AiError::validation(format!("Invalid action. Must be one of: {}", names.join(", ")))
        })?;

        let present = |v: &Option<String>| v.as_deref().map(|s| !s.is_empty()).unwrap_or(false);
        if action.is_title_only() && !present(&self.title) {
            return Err(AiError::validation("Title is required for this action"));
        }
        if !action.is_title_only() && !present(&self.body) {
            return Err(AiError::validation("Body content is required for this action"));
        }
        Ok(action)
    }
}

/// Image generation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub count: Option<i64>,
}

impl ImageRequest {
    /// Check the request and resolve the number of images
    pub fn validate(&self) -> Result<u32, AiError> {
        if self.prompt.trim().is_empty() {
            return Err(AiError::validation("A prompt is required"));
        }
        match self.count {
            None => Ok(DEFAULT_IMAGE_COUNT),
            Some(n) if (1..=MAX_IMAGE_COUNT as i64).contains(&n) => Ok(n as u32),
            Some(_) => Err(AiError::validation(format!(
                "Count must be between 1 and {}",
                MAX_IMAGE_COUNT
            ))),
        }
    }
}

/// A generated illustration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub url: String,
    #[serde(default, alias = "revised_prompt")]
    pub revised_prompt: String,
}

/// Wraps an illustration subject in the site's visual style
pub fn build_image_prompt(subject: &str) -> String {
    let mut parts: Vec<String> = IMAGE_STYLE_PROMPT.iter().map(|s| s.to_string()).collect();
    parts.push(format!("Subject: {}", truncate_chars(subject, MAX_PROMPT_LENGTH)));
    parts.join(" ")
}

/// Text and image generation backend
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Run a chat completion and return the trimmed reply
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, AiError>;

    /// Generate a single image for a fully built prompt
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, AiError>;
}

/// OpenAI chat completions and image generation
pub struct OpenAiProvider {
    http: reqwest::Client,
    config: AiConfig,
}

impl OpenAiProvider {
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, config })
    }

    fn api_key(&self) -> Result<&str, AiError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AiError::NotConfigured)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Value, AiError> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(body);
        }

        let status = status.as_u16();
        let message = upstream_message(&body);
        tracing::warn!("AI provider request to {} failed ({}): {}", path, status, message);
        if path.starts_with("images") {
            Err(AiError::Image { status, message })
        } else {
            Err(AiError::Completion { status, message })
        }
    }
}

/// `error.message` of an OpenAI error body
fn upstream_message(body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string()
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, AiError> {
        let payload = json!({
            "model": self.config.chat_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });
        let body = self.post("chat/completions", &payload).await?;
        Ok(body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default())
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, AiError> {
        let payload = json!({
            "model": self.config.image_model,
            "prompt": prompt,
            "n": 1,
            "size": self.config.image_size,
            "quality": self.config.image_quality,
        });
        let body = self.post("images/generations", &payload).await?;
        let image = body
            .pointer("/data/0")
            .cloned()
            .ok_or_else(|| AiError::InvalidResponse("Image response contained no data".to_string()))?;
        serde_json::from_value(image)
            .map_err(|e| AiError::InvalidResponse(format!("Malformed image response: {}", e)))
    }
}

/// AI assistant operations
pub struct AiService {
    provider: Arc<dyn AiProvider>,
}

impl AiService {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    /// Validate and run a text generation request
    pub async fn generate_text(&self, request: &AiRequest) -> Result<String, AiError> {
        let action = request.validate()?;
        let title = request.title.as_deref().unwrap_or("");
        let body = request.body.as_deref().unwrap_or("");

        tracing::debug!("Running AI action {}", action.as_str());
        self.provider
            .complete(&action.system_prompt(), &action.user_message(title, body))
            .await
    }

    /// Validate and run an image request, one provider call per image, concurrently
    ///
    /// Partial failures are dropped. When every call fails the first error is
    /// returned.
    pub async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, AiError> {
        let count = request.validate()?;
        let prompt = build_image_prompt(&request.prompt);

        let results = join_all((0..count).map(|_| self.provider.generate_image(&prompt))).await;

        let mut images = Vec::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(image) => images.push(image),
                Err(e) => {
                    tracing::warn!("Image generation failed: {}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if images.is_empty() {
            return Err(first_error.unwrap_or(AiError::AllImagesFailed));
        }
        Ok(images)
    }
}

static NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.\s*").unwrap());

/// First option of a numbered SEO title suggestion list
pub fn first_seo_option(result: &str) -> Option<String> {
    result
        .lines()
        .map(|line| NUMBERING.replace(line, "").trim().to_string())
        .find(|line| !line.is_empty())
}

/// Reading time of a body at 200 words per minute, at least one minute
///
/// `None` when the body has no text.
pub fn reading_time_from_blocks(blocks: &[PortableTextBlock]) -> Option<u32> {
    let text = extract_plain_text(blocks);
    let words = text.split_whitespace().count();
    if words == 0 {
        return None;
    }
    Some(reading_minutes(words).max(1))
}

/// Where the image generator takes its subject from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    Title,
    Description,
    Excerpt,
    Body,
    Custom,
}

/// Document fields an image prompt can be built from
#[derive(Debug, Clone, Default)]
pub struct PromptFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub excerpt: &'a str,
    pub body_text: &'a str,
    pub custom: &'a str,
}

/// Image subject for the selected source; body text is cut to 500 characters
pub fn prompt_from_source(source: PromptSource, fields: &PromptFields<'_>) -> String {
    match source {
        PromptSource::Title => fields.title.to_string(),
        PromptSource::Description => fields.description.to_string(),
        PromptSource::Excerpt => fields.excerpt.to_string(),
        PromptSource::Body => truncate_chars(fields.body_text, BODY_PROMPT_LENGTH).to_string(),
        PromptSource::Custom => fields.custom.to_string(),
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
