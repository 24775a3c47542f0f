//! Almas Enraizadas - a server-rendered wellness blog

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use almas::{
    api::{self, AppState},
    cache::create_cache,
    cms::{SanityClient, SanityContentRepository},
    config::Config,
    services::{AiService, ContentService, ImageProxy, OpenAiProvider},
    theme::ThemeEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "almas=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Almas Enraizadas...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Content source
    let client = SanityClient::new(config.cms.clone())?;
    tracing::info!(
        "Sanity client ready: project {}, dataset {}",
        config.cms.project_id,
        config.cms.dataset
    );
    let repo = SanityContentRepository::boxed(client);
    let cache = create_cache(&config.cache);
    let content = ContentService::new(repo, cache);

    // AI helpers
    if config.ai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, AI endpoints will answer 503");
    }
    let provider = OpenAiProvider::new(config.ai.clone())?;
    let ai = AiService::new(Arc::new(provider));

    let image_proxy = ImageProxy::new()?;

    // Initialize theme engine
    let theme_engine = ThemeEngine::new(&config.theme.path, &config.theme.active)?;
    tracing::info!("Theme engine initialized: {}", theme_engine.get_current_theme());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let cors_origin = config.server.cors_origin.clone();

    let state = AppState::new(config, content, ai, image_proxy, theme_engine);

    // Build router
    let app = api::build_router(state, &cors_origin);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
