//! `sitemap.xml` and `robots.txt`

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::middleware::{cache_control_page, AppState};
use crate::services::portable_text::html_escape;
use crate::services::routes;
use crate::services::ContentError;

/// Site sitemap built from the CMS slug enumerations
pub async fn sitemap(State(state): State<AppState>) -> Response {
    match sitemap_urls(&state).await {
        Ok(urls) => (
            [
                (header::CONTENT_TYPE, "application/xml; charset=utf-8".to_string()),
                (header::CACHE_CONTROL, cache_control_page(state.config.site.revalidate_seconds)),
            ],
            render_sitemap(&urls),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to build sitemap: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Sitemap unavailable").into_response()
        }
    }
}

async fn sitemap_urls(state: &AppState) -> Result<Vec<String>, ContentError> {
    let content = &state.content;
    let (sections, subcategories, posts, profiles, tags) = tokio::try_join!(
        content.all_section_slugs(),
        content.all_subcategory_slugs(),
        content.all_post_slugs(),
        content.all_profile_slugs(),
        content.all_tags(),
    )?;

    let urls = &state.urls;
    let mut entries: Vec<String> = [routes::HOME, routes::SECTIONS, routes::PROFILES, routes::ABOUT]
        .iter()
        .map(|path| urls.absolute(path))
        .collect();
    entries.extend(sections.iter().map(|s| urls.section(s)));
    entries.extend(
        subcategories
            .iter()
            .map(|s| urls.subcategory(&s.section_slug, &s.subcategory_slug)),
    );
    entries.extend(
        posts
            .iter()
            .map(|p| urls.post(&p.section_slug, &p.post_slug, p.subcategory_slug.as_deref())),
    );
    entries.extend(profiles.iter().map(|slug| urls.profile(slug)));
    entries.extend(
        tags.iter()
            .filter(|t| !t.slug.as_str().is_empty())
            .map(|t| urls.tag(t.slug.as_str())),
    );
    Ok(entries)
}

fn render_sitemap(urls: &[String]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str("  <url><loc>");
        xml.push_str(&html_escape(url));
        xml.push_str("</loc></url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

pub async fn robots(State(state): State<AppState>) -> Response {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: {}\nDisallow: /api/\n\nSitemap: {}\n",
        routes::STUDIO,
        state.urls.absolute("/sitemap.xml")
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}
